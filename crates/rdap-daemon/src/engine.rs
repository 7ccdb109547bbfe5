// crates/rdap-daemon/src/engine.rs
//
// Engine: the resolution components wired together.
//
// Constructed once in main.rs from the configuration, then shared by the
// query loop, the one-shot commands and the rebuild scheduler.

use std::sync::Arc;

use rdap_core::error::RdapError;
use rdap_core::object::Source;
use rdap_core::traits::ObjectStore;
use rdap_index::{IndexHandle, RebuildReport};
use rdap_resolver::{ResourceResolver, VersionResolver};
use rdap_store::{load_dump, MemoryStore};

use crate::config::DaemonConfig;

pub struct Engine {
    pub store: Arc<MemoryStore>,
    pub index: Arc<IndexHandle>,
    pub resolver: ResourceResolver,
    pub versions: VersionResolver,
}

impl Engine {
    /// Wire the components around an already populated store.
    pub fn new(store: Arc<MemoryStore>, config: &DaemonConfig) -> Self {
        let dyn_store: Arc<dyn ObjectStore> = store.clone();
        let index = Arc::new(IndexHandle::new(dyn_store.clone()));
        let resolver =
            ResourceResolver::new(index.clone(), dyn_store.clone(), config.source_registry());
        let versions = VersionResolver::new(dyn_store, config.version_granularity);
        Self {
            store,
            index,
            resolver,
            versions,
        }
    }

    /// Load the configured dump and build the first index.
    ///
    /// A missing dump leaves the store empty; a dump that fails to parse
    /// is an error. The initial rebuild must succeed.
    pub async fn start(config: &DaemonConfig, dump_path: &str) -> Result<Self, RdapError> {
        let store = match load_dump(dump_path) {
            Ok(store) => store,
            Err(RdapError::Storage(e)) => {
                tracing::warn!("{}. Starting with an empty store.", e);
                MemoryStore::new()
            }
            Err(e) => return Err(e),
        };

        let engine = Self::new(Arc::new(store), config);
        engine.check_sources().await?;
        let report = engine.rebuild().await?;
        tracing::info!(
            "Range index ready: {} entries (generation {}, built {})",
            report.entries,
            report.generation,
            engine.index.current().built_at().to_rfc3339()
        );
        Ok(engine)
    }

    /// Sources present in the store that are neither local nor redirected.
    ///
    /// Their blocks resolve to NotFound; each is logged once at start.
    pub async fn check_sources(&self) -> Result<Vec<Source>, RdapError> {
        let registry = self.resolver.sources();
        let unmapped: Vec<Source> = self
            .store
            .sources()
            .await?
            .into_iter()
            .filter(|s| !registry.is_local(s) && registry.redirect_url(s).is_none())
            .collect();
        for source in &unmapped {
            tracing::warn!("Source {} is neither local nor redirected", source);
        }
        Ok(unmapped)
    }

    pub async fn rebuild(&self) -> Result<RebuildReport, RdapError> {
        self.index.rebuild().await
    }
}
