// crates/rdap-index/src/handle.rs
//
// IndexHandle: the published "current index" plus rebuild coordination.
//
// Readers call `current()` and get an `Arc<RangeIndex>` without taking any
// lock; the snapshot they hold stays valid after later swaps. Rebuilds are
// serialised through a tokio mutex. Each request takes a ticket before
// waiting; once it holds the lock, if a finished build already started after
// the ticket was issued, the request returns that build's outcome instead of
// scanning the store again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::Mutex;

use rdap_core::error::RdapError;
use rdap_core::traits::ObjectStore;

use crate::builder::IndexBuilder;
use crate::tree::RangeIndex;

/// Outcome of a rebuild request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    /// Generation of the published snapshot.
    pub generation: u64,
    pub entries: usize,
    pub elapsed_ms: u64,
    /// True when this request was satisfied by a concurrent build.
    pub coalesced: bool,
}

#[derive(Default)]
struct RebuildState {
    /// Highest ticket covered by a finished build.
    covered: u64,
    generation: u64,
    last: Option<Result<RebuildReport, RdapError>>,
}

/// Holder of the current `RangeIndex` snapshot.
pub struct IndexHandle {
    current: ArcSwap<RangeIndex>,
    store: Arc<dyn ObjectStore>,
    requested: AtomicU64,
    rebuild: Mutex<RebuildState>,
}

impl IndexHandle {
    /// Start with an empty, unpublished index. Call `rebuild` to load data.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            current: ArcSwap::from_pointee(RangeIndex::empty()),
            store,
            requested: AtomicU64::new(0),
            rebuild: Mutex::new(RebuildState::default()),
        }
    }

    /// The snapshot to use for one query. Never blocks.
    pub fn current(&self) -> Arc<RangeIndex> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    /// Rebuild from a full scan of the store and publish the result.
    ///
    /// On failure the previous snapshot keeps serving and the error is
    /// returned; nothing is retried.
    pub async fn rebuild(&self) -> Result<RebuildReport, RdapError> {
        let ticket = self.requested.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.rebuild.lock().await;

        if state.covered >= ticket {
            if let Some(last) = &state.last {
                tracing::debug!("Rebuild request {} coalesced", ticket);
                return last.clone().map(|report| RebuildReport {
                    coalesced: true,
                    ..report
                });
            }
        }

        // Every request issued up to here is satisfied by the scan below.
        let covers = self.requested.load(Ordering::SeqCst);
        let started = Instant::now();

        let built = match self.store.current_range_records().await {
            Ok(records) => IndexBuilder::from_objects(&records),
            Err(e) => Err(RdapError::IndexBuild(format!("Store scan failed: {}", e))),
        };

        let outcome = match built {
            Ok(index) => {
                let generation = state.generation + 1;
                let index = index.with_generation(generation);
                let entries = index.len();
                self.current.store(Arc::new(index));
                state.generation = generation;

                let elapsed_ms = started.elapsed().as_millis() as u64;
                tracing::info!(
                    "Published range index generation {} ({} entries, {} ms)",
                    generation,
                    entries,
                    elapsed_ms
                );
                Ok(RebuildReport {
                    generation,
                    entries,
                    elapsed_ms,
                    coalesced: false,
                })
            }
            Err(e) => {
                tracing::warn!(
                    "Range index rebuild failed, generation {} keeps serving: {}",
                    state.generation,
                    e
                );
                Err(e)
            }
        };

        state.covered = covers;
        state.last = Some(outcome.clone());
        outcome
    }
}
