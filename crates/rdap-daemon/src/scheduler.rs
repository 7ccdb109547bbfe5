// crates/rdap-daemon/src/scheduler.rs
//
// Rebuild scheduler for the resolution daemon.
//
// Rebuilds the range index from the store at a fixed interval. A failed
// rebuild is logged and the previous snapshot keeps serving until the next
// tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use rdap_index::IndexHandle;

/// Periodically rebuilds and republishes the range index.
pub struct RebuildScheduler {
    handle: Arc<IndexHandle>,
    interval: Duration,
    completed: u64,
    failed: u64,
}

impl RebuildScheduler {
    /// Create a scheduler rebuilding every `interval_secs` seconds.
    pub fn new(handle: Arc<IndexHandle>, interval_secs: u64) -> Self {
        Self {
            handle,
            interval: Duration::from_secs(interval_secs.max(1)),
            completed: 0,
            failed: 0,
        }
    }

    /// Run until ctrl-c. The first rebuild happens one interval after start;
    /// the daemon performs its own rebuild on startup.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!(
            "Rebuild scheduler started (interval={}s)",
            self.interval.as_secs()
        );

        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + self.interval,
            self.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Rebuild scheduler received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        tracing::info!(
            "Rebuild scheduler stopped ({} completed, {} failed)",
            self.completed(),
            self.failed()
        );
        Ok(())
    }

    /// Perform one scheduled rebuild.
    pub async fn tick(&mut self) {
        match self.handle.rebuild().await {
            Ok(report) => {
                self.completed += 1;
                tracing::debug!(
                    "Scheduled rebuild done: generation {} ({} entries, coalesced={})",
                    report.generation,
                    report.entries,
                    report.coalesced
                );
            }
            Err(e) => {
                self.failed += 1;
                tracing::error!("Scheduled rebuild failed: {}", e);
            }
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rdap_core::object::RpslObject;
    use rdap_core::revision::Operation;
    use rdap_store::MemoryStore;

    fn inetnum(range: &str) -> RpslObject {
        RpslObject::from_pairs(&[("inetnum", range), ("source", "TEST")]).unwrap()
    }

    #[tokio::test]
    async fn test_tick_counts_outcomes() {
        let ts = NaiveDate::from_ymd_opt(2013, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        store.record(Operation::Create, inetnum("192.0.2.0/24"), ts).unwrap();
        let handle = Arc::new(IndexHandle::new(store.clone()));
        let mut scheduler = RebuildScheduler::new(handle.clone(), 60);

        scheduler.tick().await;
        assert_eq!(scheduler.completed(), 1);
        assert_eq!(handle.generation(), 1);

        store.record(Operation::Create, inetnum("192.0.2.128 - 192.0.3.10"), ts).unwrap();
        scheduler.tick().await;
        assert_eq!(scheduler.failed(), 1);
        assert_eq!(handle.generation(), 1);
    }
}
