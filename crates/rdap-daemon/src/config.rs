// crates/rdap-daemon/src/config.rs
//
// Runtime configuration for the resolution daemon.
// Loaded from a TOML file or populated with defaults.

use std::collections::BTreeMap;
use std::fs;

use serde::Deserialize;

use rdap_core::error::RdapError;
use rdap_core::object::Source;
use rdap_resolver::{GroupingGranularity, SourceRegistry};

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// JSON revision dump loaded into the in-memory store at start.
    #[serde(default = "default_dump_path")]
    pub dump_path: String,

    /// Sources answered locally.
    #[serde(default = "default_local_sources")]
    pub local_sources: Vec<String>,

    /// Base URL per foreign source, e.g. `OTHER = "https://rdap.example.net/rdap"`.
    #[serde(default)]
    pub redirects: BTreeMap<String, String>,

    /// Seconds between scheduled index rebuilds. 0 disables the schedule.
    #[serde(default = "default_rebuild_interval_secs")]
    pub rebuild_interval_secs: u64,

    /// Window within which revisions count as simultaneous:
    /// "second", "minute" or "hour".
    #[serde(default)]
    pub version_granularity: GroupingGranularity,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_dump_path() -> String {
    "~/.rdap/dump.json".to_string()
}

fn default_local_sources() -> Vec<String> {
    vec!["RIPE".to_string()]
}

fn default_rebuild_interval_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            dump_path: default_dump_path(),
            local_sources: default_local_sources(),
            redirects: BTreeMap::new(),
            rebuild_interval_secs: default_rebuild_interval_secs(),
            version_granularity: GroupingGranularity::default(),
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RdapError> {
        if self.local_sources.is_empty() {
            return Err(RdapError::Config(
                "At least one local source is required".to_string(),
            ));
        }
        for (source, url) in &self.redirects {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(RdapError::Config(format!(
                    "Redirect for {} is not an http(s) URL: '{}'",
                    source, url
                )));
            }
            if self
                .local_sources
                .iter()
                .any(|local| local.eq_ignore_ascii_case(source))
            {
                return Err(RdapError::Config(format!(
                    "Source {} is both local and redirected",
                    source
                )));
            }
        }
        Ok(())
    }

    pub fn source_registry(&self) -> SourceRegistry {
        SourceRegistry::new(
            self.local_sources.iter().map(|s| Source::new(s)),
            self.redirects
                .iter()
                .map(|(source, url)| (Source::new(source), url.clone())),
        )
    }
}
