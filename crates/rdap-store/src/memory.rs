// crates/rdap-store/src/memory.rs
//
// In-memory revision store implementing the `ObjectStore` trait.
//
// Records are keyed by `(source, object type, normalised key)` and hold
// their full revision log, oldest first. The current state of a record is
// its last revision unless that revision is a DELETE.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use rdap_core::error::RdapError;
use rdap_core::object::{ObjectType, RpslObject, Source};
use rdap_core::revision::{Operation, Revision};
use rdap_core::traits::ObjectStore;

type RecordKey = (Source, ObjectType, String);

/// Append-only revision log held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<RecordKey, Vec<Revision>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_key(source: &Source, object_type: ObjectType, key: &str) -> RecordKey {
        (source.clone(), object_type, object_type.normalize_key(key))
    }

    /// Append a revision to its record's log.
    ///
    /// Sequence numbers must be strictly increasing per record.
    pub fn append(&self, revision: Revision) -> Result<(), RdapError> {
        let key = Self::record_key(
            revision.object.source(),
            revision.object.object_type(),
            revision.object.key(),
        );
        let mut records = self
            .records
            .write()
            .map_err(|e| RdapError::Storage(format!("RwLock poisoned: {}", e)))?;

        let log = records.entry(key).or_default();
        if let Some(last) = log.last() {
            if revision.sequence <= last.sequence {
                return Err(RdapError::Storage(format!(
                    "Non-monotonic sequence {} for {} '{}' (last {})",
                    revision.sequence,
                    revision.object.object_type(),
                    revision.object.key(),
                    last.sequence
                )));
            }
        }
        log.push(revision);
        Ok(())
    }

    /// Append a revision with the next sequence number for its record.
    ///
    /// The sequence is assigned under the same write lock as the append.
    /// Returns the assigned sequence number.
    pub fn record(
        &self,
        operation: Operation,
        object: RpslObject,
        timestamp: NaiveDateTime,
    ) -> Result<u64, RdapError> {
        let key = Self::record_key(object.source(), object.object_type(), object.key());
        let mut records = self
            .records
            .write()
            .map_err(|e| RdapError::Storage(format!("RwLock poisoned: {}", e)))?;

        let log = records.entry(key).or_default();
        let sequence = log.last().map(|r| r.sequence + 1).unwrap_or(1);
        log.push(Revision {
            sequence,
            operation,
            timestamp,
            object,
        });
        Ok(sequence)
    }

    /// Number of records (keys), deleted ones included.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn current_state(log: &[Revision]) -> Option<&RpslObject> {
    log.last().filter(|r| !r.is_delete()).map(|r| &r.object)
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(
        &self,
        source: &Source,
        object_type: ObjectType,
        key: &str,
    ) -> Result<Option<RpslObject>, RdapError> {
        let records = self
            .records
            .read()
            .map_err(|e| RdapError::Storage(format!("RwLock poisoned: {}", e)))?;
        Ok(records
            .get(&Self::record_key(source, object_type, key))
            .and_then(|log| current_state(log))
            .cloned())
    }

    async fn revisions_before(
        &self,
        source: &Source,
        object_type: ObjectType,
        key: &str,
        at: NaiveDateTime,
    ) -> Result<Vec<Revision>, RdapError> {
        let records = self
            .records
            .read()
            .map_err(|e| RdapError::Storage(format!("RwLock poisoned: {}", e)))?;

        let mut revisions: Vec<Revision> = records
            .get(&Self::record_key(source, object_type, key))
            .map(|log| log.iter().filter(|r| r.timestamp <= at).cloned().collect())
            .unwrap_or_default();

        revisions.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        Ok(revisions)
    }

    async fn current_range_records(&self) -> Result<Vec<RpslObject>, RdapError> {
        let records = self
            .records
            .read()
            .map_err(|e| RdapError::Storage(format!("RwLock poisoned: {}", e)))?;

        Ok(records
            .iter()
            .filter(|((_, object_type, _), _)| object_type.is_range())
            .filter_map(|(_, log)| current_state(log).cloned())
            .collect())
    }

    async fn sources(&self) -> Result<Vec<Source>, RdapError> {
        let records = self
            .records
            .read()
            .map_err(|e| RdapError::Storage(format!("RwLock poisoned: {}", e)))?;
        let sources: BTreeSet<Source> = records.keys().map(|(s, _, _)| s.clone()).collect();
        Ok(sources.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32, min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 3, day)
            .unwrap()
            .and_hms_opt(hour, min, sec)
            .unwrap()
    }

    fn inetnum(source: &str) -> RpslObject {
        RpslObject::from_pairs(&[
            ("inetnum", "192.0.2.0 - 192.0.2.255"),
            ("netname", "TEST-NET"),
            ("source", source),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_current_state_follows_last_revision() {
        let store = MemoryStore::new();
        let src = Source::new("TEST");
        store.record(Operation::Create, inetnum("TEST"), ts(1, 0, 0, 0)).unwrap();

        let found = store
            .get_object(&src, ObjectType::Inetnum, "192.0.2.0/24")
            .await
            .unwrap();
        assert!(found.is_some());

        store.record(Operation::Delete, inetnum("TEST"), ts(2, 0, 0, 0)).unwrap();
        let gone = store
            .get_object(&src, ObjectType::Inetnum, "192.0.2.0 - 192.0.2.255")
            .await
            .unwrap();
        assert!(gone.is_none());
        assert!(store.current_range_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revisions_before_newest_first() {
        let store = MemoryStore::new();
        let src = Source::new("TEST");
        store.record(Operation::Create, inetnum("TEST"), ts(1, 0, 0, 0)).unwrap();
        store.record(Operation::Modify, inetnum("TEST"), ts(2, 0, 0, 0)).unwrap();
        store.record(Operation::Modify, inetnum("TEST"), ts(3, 0, 0, 0)).unwrap();

        let revisions = store
            .revisions_before(&src, ObjectType::Inetnum, "192.0.2.0/24", ts(2, 12, 0, 0))
            .await
            .unwrap();
        let sequences: Vec<u64> = revisions.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![2, 1]);
    }

    #[test]
    fn test_non_monotonic_sequence_rejected() {
        let store = MemoryStore::new();
        store
            .append(Revision {
                sequence: 5,
                operation: Operation::Create,
                timestamp: ts(1, 0, 0, 0),
                object: inetnum("TEST"),
            })
            .unwrap();
        let err = store
            .append(Revision {
                sequence: 5,
                operation: Operation::Modify,
                timestamp: ts(2, 0, 0, 0),
                object: inetnum("TEST"),
            })
            .unwrap_err();
        assert!(matches!(err, RdapError::Storage(_)));
    }

    #[tokio::test]
    async fn test_concurrent_records_get_distinct_sequences() {
        let store = MemoryStore::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        store
                            .record(Operation::Modify, inetnum("TEST"), ts(1, 0, 0, 0))
                            .unwrap();
                    }
                });
            }
        });

        let revisions = store
            .revisions_before(
                &Source::new("TEST"),
                ObjectType::Inetnum,
                "192.0.2.0/24",
                ts(2, 0, 0, 0),
            )
            .await
            .unwrap();
        assert_eq!(revisions.len(), 400);
        let sequences: BTreeSet<u64> = revisions.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, (1..=400).collect());
    }

    #[tokio::test]
    async fn test_sources_are_partitioned() {
        let store = MemoryStore::new();
        store.record(Operation::Create, inetnum("TEST"), ts(1, 0, 0, 0)).unwrap();
        store.record(Operation::Create, inetnum("OTHER"), ts(1, 0, 0, 0)).unwrap();

        assert_eq!(store.len(), 2);
        let sources = store.sources().await.unwrap();
        assert_eq!(sources, vec![Source::new("OTHER"), Source::new("TEST")]);
        assert_eq!(store.current_range_records().await.unwrap().len(), 2);
    }
}
