// crates/rdap-store/src/dump.rs
//
// JSON dump loader. A dump is an array of revision records in append order:
//
//   [
//     { "operation": "CREATE",
//       "timestamp": "2013-01-01T10:00:00",
//       "object": [ { "name": "inetnum", "value": "192.0.2.0 - 192.0.2.255" },
//                   { "name": "source",  "value": "TEST" } ] }
//   ]
//
// `sequence` is optional; when absent the next sequence for the record is
// assigned.

use std::fs;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use rdap_core::error::RdapError;
use rdap_core::object::RpslObject;
use rdap_core::revision::{Operation, Revision};

use crate::memory::MemoryStore;

/// One revision as it appears in a dump file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpRecord {
    #[serde(default)]
    pub sequence: Option<u64>,
    pub operation: Operation,
    pub timestamp: NaiveDateTime,
    pub object: RpslObject,
}

/// Parse dump JSON and append every record to a fresh store.
pub fn parse_dump(json: &str) -> Result<MemoryStore, RdapError> {
    let records: Vec<DumpRecord> = serde_json::from_str(json)?;
    let store = MemoryStore::new();

    for record in records {
        match record.sequence {
            Some(sequence) => store.append(Revision {
                sequence,
                operation: record.operation,
                timestamp: record.timestamp,
                object: record.object,
            })?,
            None => {
                store.record(record.operation, record.object, record.timestamp)?;
            }
        }
    }

    Ok(store)
}

/// Read a dump file from disk into a fresh store.
pub fn load_dump(path: &str) -> Result<MemoryStore, RdapError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| RdapError::Storage(format!("Failed to read dump {}: {}", path, e)))?;
    let store = parse_dump(&contents)?;
    tracing::info!("Loaded {} records from {}", store.len(), path);
    Ok(store)
}
