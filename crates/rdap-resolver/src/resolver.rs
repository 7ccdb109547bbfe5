// crates/rdap-resolver/src/resolver.rs
//
// ResourceResolver: dispatches a parsed query key to the range index or a
// direct store lookup and decides between a local answer and a redirect.
//
// Address and AS queries load the current index snapshot once and use it for
// the whole request, so a concurrent rebuild never mixes two snapshots into
// one answer.

use std::sync::Arc;

use serde::Serialize;

use rdap_core::error::RdapError;
use rdap_core::object::{ObjectType, RpslObject, Source};
use rdap_core::range::{RangeEntry, ResourceRange};
use rdap_core::traits::ObjectStore;
use rdap_index::{IndexHandle, RangeIndex};

use crate::handle;
use crate::query::{MatchMode, QueryKey};
use crate::redact::sanitize;
use crate::roles::{RoleAggregator, RoleEntity};
use crate::sources::SourceRegistry;

/// Where a foreign record is served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub source: Source,
    pub base_url: String,
    /// Absolute URL of the original query at the foreign registry.
    pub location: String,
}

impl Redirect {
    pub fn new(source: Source, base_url: &str, path: &str) -> Self {
        let mut redirect = Self {
            source,
            base_url: base_url.to_string(),
            location: String::new(),
        };
        redirect.location = redirect.location(path);
        redirect
    }

    /// Absolute location for `path` (e.g. `QueryKey::path()`) at the
    /// foreign registry.
    pub fn location(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Outcome of resolving one query key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Found {
        /// Sanitised record.
        object: RpslObject,
        entities: Vec<RoleEntity>,
        source: Source,
    },
    Redirect(Redirect),
    NotFound,
}

pub struct ResourceResolver {
    index: Arc<IndexHandle>,
    store: Arc<dyn ObjectStore>,
    sources: SourceRegistry,
    roles: RoleAggregator,
}

impl ResourceResolver {
    pub fn new(
        index: Arc<IndexHandle>,
        store: Arc<dyn ObjectStore>,
        sources: SourceRegistry,
    ) -> Self {
        let roles = RoleAggregator::new(store.clone());
        Self {
            index,
            store,
            sources,
            roles,
        }
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Resolve `key` under `mode`.
    ///
    /// Domain and entity keys are exact handles; any mode other than the
    /// default is a BadRequest for them.
    pub async fn resolve(
        &self,
        key: &QueryKey,
        mode: MatchMode,
    ) -> Result<Resolution, RdapError> {
        match key {
            QueryKey::Address(range) | QueryKey::Autnum(range) => {
                let snapshot = self.index.current();
                let entry = match mode.select(&snapshot, range) {
                    Some(entry) => entry.clone(),
                    None => {
                        tracing::debug!(
                            "No {} match for {} in generation {}",
                            mode,
                            key,
                            snapshot.generation()
                        );
                        return Ok(Resolution::NotFound);
                    }
                };
                self.resolve_entry(&entry, &snapshot, &key.path()).await
            }
            QueryKey::Domain(name) => {
                Self::require_default_mode(key, mode)?;
                self.resolve_local(&[ObjectType::Domain], name).await
            }
            QueryKey::Entity(handle_key) => {
                Self::require_default_mode(key, mode)?;
                let kind = handle::classify(handle_key).ok_or_else(|| {
                    RdapError::BadRequest(format!(
                        "Invalid syntax for entity handle '{}'",
                        handle_key
                    ))
                })?;
                self.resolve_local(kind.candidate_types(), handle_key).await
            }
        }
    }

    /// Every indexed entry containing an address or AS key, most specific
    /// first.
    pub fn hierarchy(&self, key: &QueryKey) -> Result<Vec<RangeEntry>, RdapError> {
        let range = Self::require_range(key)?;
        let snapshot = self.index.current();
        Ok(snapshot.ancestors(range).into_iter().cloned().collect())
    }

    /// Entries one level more specific than an address or AS key.
    pub fn more_specifics(&self, key: &QueryKey) -> Result<Vec<RangeEntry>, RdapError> {
        let range = Self::require_range(key)?;
        let snapshot = self.index.current();
        Ok(snapshot.more_specifics(range).into_iter().cloned().collect())
    }

    fn require_range(key: &QueryKey) -> Result<&ResourceRange, RdapError> {
        key.range().ok_or_else(|| {
            RdapError::BadRequest(format!("{} queries have no address hierarchy", key.kind()))
        })
    }

    fn require_default_mode(key: &QueryKey, mode: MatchMode) -> Result<(), RdapError> {
        if mode != MatchMode::default() {
            return Err(RdapError::BadRequest(format!(
                "{} match is not applicable to {} queries",
                mode,
                key.kind()
            )));
        }
        Ok(())
    }

    async fn resolve_entry(
        &self,
        entry: &RangeEntry,
        snapshot: &RangeIndex,
        path: &str,
    ) -> Result<Resolution, RdapError> {
        if !self.sources.is_local(&entry.source) {
            return Ok(match self.sources.redirect_url(&entry.source) {
                Some(base_url) => {
                    Resolution::Redirect(Redirect::new(entry.source.clone(), base_url, path))
                }
                None => {
                    tracing::warn!(
                        "{} '{}' belongs to source {} with no redirect configured",
                        entry.object_type,
                        entry.key,
                        entry.source
                    );
                    Resolution::NotFound
                }
            });
        }

        match self
            .store
            .get_object(&entry.source, entry.object_type, &entry.key)
            .await?
        {
            Some(object) => self.found(object, snapshot).await,
            None => {
                // Deleted after the snapshot was built.
                tracing::debug!(
                    "{} '{}' ({}) indexed but no longer current",
                    entry.object_type,
                    entry.key,
                    entry.source
                );
                Ok(Resolution::NotFound)
            }
        }
    }

    async fn resolve_local(
        &self,
        object_types: &[ObjectType],
        key: &str,
    ) -> Result<Resolution, RdapError> {
        for source in self.sources.local_sources() {
            for &object_type in object_types {
                if let Some(object) = self.store.get_object(source, object_type, key).await? {
                    let snapshot = self.index.current();
                    return self.found(object, &snapshot).await;
                }
            }
        }
        Ok(Resolution::NotFound)
    }

    async fn found(
        &self,
        object: RpslObject,
        snapshot: &RangeIndex,
    ) -> Result<Resolution, RdapError> {
        let entities = self.roles.aggregate(&object, snapshot).await?;
        let source = object.source().clone();
        Ok(Resolution::Found {
            object: sanitize(object),
            entities,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rdap_core::revision::Operation;
    use rdap_store::MemoryStore;

    use crate::query::QueryKind;
    use crate::roles::Role;

    fn object(pairs: &[(&str, &str)]) -> RpslObject {
        RpslObject::from_pairs(pairs).unwrap()
    }

    async fn setup(records: Vec<RpslObject>) -> (Arc<MemoryStore>, ResourceResolver) {
        let ts = NaiveDate::from_ymd_opt(2013, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        for record in records {
            store.record(Operation::Create, record, ts).unwrap();
        }
        let index = Arc::new(IndexHandle::new(store.clone()));
        index.rebuild().await.unwrap();
        let sources = SourceRegistry::default()
            .with_local("TEST")
            .with_redirect("OTHER", "https://rdap.other.example/rdap");
        let resolver = ResourceResolver::new(index, store.clone(), sources);
        (store, resolver)
    }

    fn records() -> Vec<RpslObject> {
        vec![
            object(&[
                ("inetnum", "192.0.0.0 - 192.255.255.255"),
                ("netname", "TEST-NET-PARENT"),
                ("source", "TEST"),
            ]),
            object(&[
                ("inetnum", "192.0.2.0 - 192.0.2.255"),
                ("netname", "TEST-NET"),
                ("admin-c", "TP1-TEST"),
                ("tech-c", "TP1-TEST"),
                ("mnt-by", "OWNER-MNT"),
                ("notify", "noc@example.net"),
                ("source", "TEST"),
            ]),
            object(&[
                ("inetnum", "10.0.0.0 - 10.255.255.255"),
                ("netname", "OTHER-NET"),
                ("source", "OTHER"),
            ]),
            object(&[
                ("inetnum", "172.16.0.0 - 172.31.255.255"),
                ("netname", "UNMAPPED-NET"),
                ("source", "UNMAPPED"),
            ]),
            object(&[
                ("person", "Test Person"),
                ("nic-hdl", "TP1-TEST"),
                ("e-mail", "tp1@example.net"),
                ("source", "TEST"),
            ]),
            object(&[
                ("mntner", "OWNER-MNT"),
                ("auth", "MD5-PW secret"),
                ("source", "TEST"),
            ]),
            object(&[
                ("domain", "2.0.192.in-addr.arpa"),
                ("zone-c", "TP1-TEST"),
                ("source", "TEST"),
            ]),
        ]
    }

    fn ip(raw: &str) -> QueryKey {
        QueryKey::parse(QueryKind::Ip, raw).unwrap()
    }

    #[tokio::test]
    async fn test_found_most_specific_with_entities() {
        let (_, resolver) = setup(records()).await;
        match resolver.resolve(&ip("192.0.2.1"), MatchMode::MostSpecific).await.unwrap() {
            Resolution::Found {
                object,
                entities,
                source,
            } => {
                assert_eq!(object.first_value("netname"), Some("TEST-NET"));
                assert!(!object.has_attribute("notify"));
                assert_eq!(source, Source::new("TEST"));
                assert_eq!(entities[0].handle, "OWNER-MNT");
                assert_eq!(entities[0].roles, vec![Role::Registrant]);
                assert_eq!(entities[1].roles, vec![Role::Administrative, Role::Technical]);
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unassigned_address_not_found() {
        let (_, resolver) = setup(records()).await;
        let outcome = resolver.resolve(&ip("193.0.0.0"), MatchMode::MostSpecific).await.unwrap();
        assert_eq!(outcome, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_exact_mode_does_not_fall_back() {
        let (_, resolver) = setup(records()).await;
        let outcome = resolver.resolve(&ip("192.0.3.0/24"), MatchMode::Exact).await.unwrap();
        assert_eq!(outcome, Resolution::NotFound);

        match resolver.resolve(&ip("192.0.2.0/24"), MatchMode::Exact).await.unwrap() {
            Resolution::Found { object, .. } => assert_eq!(object.key(), "192.0.2.0 - 192.0.2.255"),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_less_specific_mode() {
        let (_, resolver) = setup(records()).await;
        match resolver.resolve(&ip("192.0.2.0/24"), MatchMode::LessSpecific).await.unwrap() {
            Resolution::Found { object, .. } => {
                assert_eq!(object.first_value("netname"), Some("TEST-NET-PARENT"))
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_foreign_source_redirects() {
        let (_, resolver) = setup(records()).await;
        let key = ip("10.1.2.3");
        match resolver.resolve(&key, MatchMode::MostSpecific).await.unwrap() {
            Resolution::Redirect(redirect) => {
                assert_eq!(redirect.source, Source::new("OTHER"));
                assert_eq!(redirect.location, "https://rdap.other.example/rdap/ip/10.1.2.3");
            }
            other => panic!("expected Redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_foreign_source_without_url_not_found() {
        let (_, resolver) = setup(records()).await;
        let outcome = resolver.resolve(&ip("172.16.0.1"), MatchMode::MostSpecific).await.unwrap();
        assert_eq!(outcome, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_entity_lookup_tries_person_then_mntner() {
        let (_, resolver) = setup(records()).await;
        let person = QueryKey::parse(QueryKind::Entity, "tp1-test").unwrap();
        match resolver.resolve(&person, MatchMode::default()).await.unwrap() {
            Resolution::Found { object, .. } => {
                assert_eq!(object.object_type(), ObjectType::Person);
                assert!(!object.has_attribute("e-mail"));
            }
            other => panic!("expected Found, got {:?}", other),
        }

        let mntner = QueryKey::parse(QueryKind::Entity, "OWNER-MNT").unwrap();
        match resolver.resolve(&mntner, MatchMode::default()).await.unwrap() {
            Resolution::Found { object, .. } => {
                assert_eq!(object.object_type(), ObjectType::Mntner);
                assert!(!object.has_attribute("auth"));
            }
            other => panic!("expected Found, got {:?}", other),
        }

        let missing = QueryKey::parse(QueryKind::Entity, "NO1-TEST").unwrap();
        assert_eq!(
            resolver.resolve(&missing, MatchMode::default()).await.unwrap(),
            Resolution::NotFound
        );
    }

    #[tokio::test]
    async fn test_domain_lookup_and_mode_rejection() {
        let (_, resolver) = setup(records()).await;
        let key = QueryKey::parse(QueryKind::Domain, "2.0.192.in-addr.arpa").unwrap();
        match resolver.resolve(&key, MatchMode::MostSpecific).await.unwrap() {
            Resolution::Found { entities, .. } => {
                assert_eq!(entities[0].handle, "TP1-TEST");
                assert_eq!(entities[0].roles, vec![Role::Zone]);
            }
            other => panic!("expected Found, got {:?}", other),
        }

        let err = resolver.resolve(&key, MatchMode::LessSpecific).await.unwrap_err();
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_hierarchy_and_more_specifics() {
        let (_, resolver) = setup(records()).await;
        let chain = resolver.hierarchy(&ip("192.0.2.7")).unwrap();
        let keys: Vec<&str> = chain.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["192.0.2.0 - 192.0.2.255", "192.0.0.0 - 192.255.255.255"]);

        let children = resolver.more_specifics(&ip("192.0.0.0/8")).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].key, "192.0.2.0 - 192.0.2.255");

        let entity = QueryKey::parse(QueryKind::Entity, "TP1-TEST").unwrap();
        assert!(resolver.hierarchy(&entity).unwrap_err().is_bad_request());
    }

    #[tokio::test]
    async fn test_deleted_after_snapshot_is_not_found() {
        let (store, resolver) = setup(records()).await;
        let ts = NaiveDate::from_ymd_opt(2013, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        store
            .record(
                Operation::Delete,
                object(&[("inetnum", "192.0.2.0/24"), ("source", "TEST")]),
                ts,
            )
            .unwrap();

        // The snapshot still holds the entry; the store no longer does.
        let outcome = resolver
            .resolve(&ip("192.0.2.1"), MatchMode::MostSpecific)
            .await
            .unwrap();
        assert_eq!(outcome, Resolution::NotFound);
    }

    #[test]
    fn test_redirect_location_joins_path() {
        let redirect = Redirect::new(
            Source::new("OTHER"),
            "https://rdap.other.example/",
            "/autnum/123",
        );
        assert_eq!(redirect.location, "https://rdap.other.example/autnum/123");
        assert_eq!(
            redirect.location("domain/2.0.192.in-addr.arpa"),
            "https://rdap.other.example/domain/2.0.192.in-addr.arpa"
        );

        let json = serde_json::to_value(Resolution::Redirect(redirect)).unwrap();
        assert_eq!(json["outcome"], "redirect");
        assert_eq!(json["location"], "https://rdap.other.example/autnum/123");
    }
}
