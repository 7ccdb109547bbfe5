// crates/rdap-resolver/src/query.rs
//
// Typed query keys and match modes.
//
// A key is parsed once, up front; a malformed key is a BadRequest and never
// reaches the index or the store.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use rdap_core::error::RdapError;
use rdap_core::range::{RangeEntry, ResourceRange};
use rdap_index::RangeIndex;

use crate::handle;

static REVERSE_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9-]{1,63}\.)+(?:in-addr|ip6)\.arpa$")
        .expect("Invalid reverse domain regex")
});

const REVERSE_ZONES: [&str; 2] = ["in-addr.arpa", "ip6.arpa"];

static AS_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^AS[0-9]+(\s*-\s*AS[0-9]+)?$").expect("Invalid AS key regex")
});

/// The object family a query addresses, as named in lookup paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Ip,
    Autnum,
    Domain,
    Entity,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Ip => "ip",
            QueryKind::Autnum => "autnum",
            QueryKind::Domain => "domain",
            QueryKind::Entity => "entity",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = RdapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ip" => Ok(QueryKind::Ip),
            "autnum" => Ok(QueryKind::Autnum),
            "domain" => Ok(QueryKind::Domain),
            "entity" => Ok(QueryKind::Entity),
            other => Err(RdapError::BadRequest(format!("Unknown query kind '{}'", other))),
        }
    }
}

/// A parsed, validated query key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKey {
    /// IPv4 or IPv6 address or range.
    Address(ResourceRange),
    /// AS number or AS range.
    Autnum(ResourceRange),
    /// Reverse-DNS name, lower-case without trailing dot.
    Domain(String),
    /// Entity handle, upper-case.
    Entity(String),
}

impl QueryKey {
    /// Parse `raw` as a key of the given kind.
    pub fn parse(kind: QueryKind, raw: &str) -> Result<Self, RdapError> {
        match kind {
            QueryKind::Ip => ResourceRange::parse_ip(raw).map(QueryKey::Address),
            QueryKind::Autnum => ResourceRange::parse_asn(raw).map(QueryKey::Autnum),
            QueryKind::Domain => Self::domain(raw),
            QueryKind::Entity => Self::entity(raw),
        }
    }

    /// Guess the kind of a free-form legacy query argument.
    pub fn detect(raw: &str) -> Result<Self, RdapError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RdapError::BadRequest("Empty query".to_string()));
        }
        if let Ok(range) = ResourceRange::parse_ip(raw) {
            return Ok(QueryKey::Address(range));
        }
        if AS_KEY.is_match(raw) {
            return ResourceRange::parse_asn(raw).map(QueryKey::Autnum);
        }
        if raw.contains('.') {
            return Self::domain(raw);
        }
        if handle::classify(raw).is_some() {
            return Self::entity(raw);
        }
        Err(RdapError::BadRequest(format!("Invalid search key '{}'", raw)))
    }

    fn domain(raw: &str) -> Result<Self, RdapError> {
        let name = raw.trim().trim_end_matches('.').to_ascii_lowercase();
        let reverse = REVERSE_ZONES.iter().any(|zone| {
            name.strip_suffix(zone)
                .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'))
        });
        if !reverse {
            return Err(RdapError::BadRequest(format!(
                "{} query not supported for forward domains",
                name
            )));
        }
        if !REVERSE_DOMAIN.is_match(&name) {
            return Err(RdapError::BadRequest(format!("Invalid domain name '{}'", name)));
        }
        Ok(QueryKey::Domain(name))
    }

    fn entity(raw: &str) -> Result<Self, RdapError> {
        let raw = raw.trim();
        match handle::classify(raw) {
            Some(_) => Ok(QueryKey::Entity(raw.to_ascii_uppercase())),
            None => Err(RdapError::BadRequest(format!(
                "Invalid syntax for entity handle '{}'",
                raw
            ))),
        }
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            QueryKey::Address(_) => QueryKind::Ip,
            QueryKey::Autnum(_) => QueryKind::Autnum,
            QueryKey::Domain(_) => QueryKind::Domain,
            QueryKey::Entity(_) => QueryKind::Entity,
        }
    }

    /// The range for address and AS keys.
    pub fn range(&self) -> Option<&ResourceRange> {
        match self {
            QueryKey::Address(range) | QueryKey::Autnum(range) => Some(range),
            QueryKey::Domain(_) | QueryKey::Entity(_) => None,
        }
    }

    /// Lookup path for this key, e.g. `ip/192.0.2.0/24` or `autnum/123`.
    pub fn path(&self) -> String {
        match self {
            QueryKey::Address(range) => {
                let start = range.format_value(range.start());
                if range.is_point() {
                    format!("ip/{}", start)
                } else if let Some(len) = range.prefix_len() {
                    format!("ip/{}/{}", start, len)
                } else {
                    format!("ip/{} - {}", start, range.format_value(range.end()))
                }
            }
            QueryKey::Autnum(range) if range.is_point() => format!("autnum/{}", range.start()),
            QueryKey::Autnum(range) => format!("autnum/{}-{}", range.start(), range.end()),
            QueryKey::Domain(name) => format!("domain/{}", name),
            QueryKey::Entity(handle) => format!("entity/{}", handle),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Address(range) | QueryKey::Autnum(range) => write!(f, "{}", range),
            QueryKey::Domain(name) => f.write_str(name),
            QueryKey::Entity(handle) => f.write_str(handle),
        }
    }
}

/// How an address or AS key is matched against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Smallest entry containing the key.
    #[default]
    MostSpecific,
    /// Entry with identical bounds only.
    Exact,
    /// Entry with identical bounds if indexed, otherwise the most specific
    /// containing entry. The exact entry always wins over an ancestor.
    ExactOrLessSpecific,
    /// First entry strictly larger than the key (one level less specific).
    LessSpecific,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::MostSpecific => "most-specific",
            MatchMode::Exact => "exact",
            MatchMode::ExactOrLessSpecific => "exact-or-less-specific",
            MatchMode::LessSpecific => "less-specific",
        }
    }

    /// Apply the mode to one snapshot.
    pub fn select<'a>(
        &self,
        index: &'a RangeIndex,
        range: &ResourceRange,
    ) -> Option<&'a RangeEntry> {
        match self {
            MatchMode::MostSpecific => index.lookup(range, false),
            MatchMode::Exact => index.lookup(range, true),
            MatchMode::ExactOrLessSpecific => index
                .lookup(range, true)
                .or_else(|| index.lookup(range, false)),
            MatchMode::LessSpecific => index.less_specific(range),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = RdapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "most-specific" => Ok(MatchMode::MostSpecific),
            "exact" | "x" => Ok(MatchMode::Exact),
            "exact-or-less-specific" => Ok(MatchMode::ExactOrLessSpecific),
            "less-specific" | "l" => Ok(MatchMode::LessSpecific),
            other => Err(RdapError::BadRequest(format!("Unknown match mode '{}'", other))),
        }
    }
}
