// crates/rdap-resolver/src/sources.rs
//
// Source registry: which partitions are served locally and where requests
// for the others are redirected.

use std::collections::{BTreeMap, BTreeSet};

use rdap_core::object::Source;

#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    local: BTreeSet<Source>,
    redirects: BTreeMap<Source, String>,
}

impl SourceRegistry {
    pub fn new<L, R>(local: L, redirects: R) -> Self
    where
        L: IntoIterator<Item = Source>,
        R: IntoIterator<Item = (Source, String)>,
    {
        Self {
            local: local.into_iter().collect(),
            redirects: redirects
                .into_iter()
                .map(|(source, url)| (source, url.trim_end_matches('/').to_string()))
                .collect(),
        }
    }

    pub fn with_local(mut self, source: &str) -> Self {
        self.local.insert(Source::new(source));
        self
    }

    pub fn with_redirect(mut self, source: &str, base_url: &str) -> Self {
        self.redirects
            .insert(Source::new(source), base_url.trim_end_matches('/').to_string());
        self
    }

    pub fn is_local(&self, source: &Source) -> bool {
        self.local.contains(source)
    }

    /// Base URL for a foreign source. Local sources never redirect.
    pub fn redirect_url(&self, source: &Source) -> Option<&str> {
        if self.is_local(source) {
            return None;
        }
        self.redirects.get(source).map(String::as_str)
    }

    pub fn local_sources(&self) -> impl Iterator<Item = &Source> {
        self.local.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_and_redirect() {
        let registry = SourceRegistry::default()
            .with_local("test")
            .with_redirect("OTHER", "https://rdap.example.net/");

        assert!(registry.is_local(&Source::new("TEST")));
        assert!(!registry.is_local(&Source::new("OTHER")));
        assert_eq!(
            registry.redirect_url(&Source::new("other")),
            Some("https://rdap.example.net")
        );
        assert_eq!(registry.redirect_url(&Source::new("UNKNOWN")), None);
    }

    #[test]
    fn test_local_source_never_redirects() {
        let registry = SourceRegistry::new(
            vec![Source::new("TEST")],
            vec![(Source::new("TEST"), "https://elsewhere.example".to_string())],
        );
        assert_eq!(registry.redirect_url(&Source::new("TEST")), None);
        assert_eq!(registry.local_sources().count(), 1);
    }
}
