// crates/rdap-daemon/src/legacy.rs
//
// Line-oriented query protocol used by `rdap-daemon serve`.
//
// One query per line: optional flags followed by the search key.
//
//   -x  exact match only
//   -l  one level less specific
//   -L  all less specific (the full containing hierarchy)
//   -m  one level more specific
//
// Every answer is one line of compact JSON carrying the original query.

use serde_json::{json, Value};

use rdap_core::error::RdapError;
use rdap_resolver::{MatchMode, QueryKey};

use crate::engine::Engine;

/// What a legacy query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyMode {
    Match(MatchMode),
    AllLessSpecific,
    OneMoreSpecific,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyQuery {
    pub mode: LegacyMode,
    pub key: QueryKey,
}

/// Parse one query line.
pub fn parse_line(line: &str) -> Result<LegacyQuery, RdapError> {
    let mut mode = LegacyMode::Match(MatchMode::default());
    let mut rest: Vec<&str> = Vec::new();

    for token in line.split_whitespace() {
        if !rest.is_empty() || !token.starts_with('-') || token.len() < 2 {
            rest.push(token);
            continue;
        }
        let next = match token {
            "-x" => LegacyMode::Match(MatchMode::Exact),
            "-l" => LegacyMode::Match(MatchMode::LessSpecific),
            "-L" => LegacyMode::AllLessSpecific,
            "-m" => LegacyMode::OneMoreSpecific,
            other => {
                return Err(RdapError::BadRequest(format!("Unknown flag '{}'", other)));
            }
        };
        if mode != LegacyMode::Match(MatchMode::default()) && mode != next {
            return Err(RdapError::BadRequest(format!(
                "Flag '{}' conflicts with an earlier flag",
                token
            )));
        }
        mode = next;
    }

    let key = QueryKey::detect(&rest.join(" "))?;
    if mode != LegacyMode::Match(MatchMode::default()) && key.range().is_none() {
        return Err(RdapError::BadRequest(format!(
            "Flags only apply to address and AS queries, not {}",
            key.kind()
        )));
    }
    Ok(LegacyQuery { mode, key })
}

/// Answer one query line.
pub async fn answer(engine: &Engine, line: &str) -> Value {
    match execute(engine, line).await {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("Query '{}' failed: {}", line, e);
            json!({
                "query": line,
                "outcome": if e.is_bad_request() { "bad_request" } else { "error" },
                "error": e.to_string(),
            })
        }
    }
}

async fn execute(engine: &Engine, line: &str) -> Result<Value, RdapError> {
    let query = parse_line(line)?;
    let mut value = match query.mode {
        LegacyMode::Match(mode) => {
            let resolution = engine.resolver.resolve(&query.key, mode).await?;
            serde_json::to_value(&resolution)?
        }
        LegacyMode::AllLessSpecific => json!({
            "outcome": "hierarchy",
            "entries": engine.resolver.hierarchy(&query.key)?,
        }),
        LegacyMode::OneMoreSpecific => json!({
            "outcome": "more_specifics",
            "entries": engine.resolver.more_specifics(&query.key)?,
        }),
    };
    if let Value::Object(map) = &mut value {
        map.insert("query".to_string(), Value::String(line.to_string()));
    }
    Ok(value)
}
