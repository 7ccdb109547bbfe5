// crates/rdap-core/src/revision.rs
//
// Historical revisions of a record. Revisions are appended by the update
// pipeline and only ever read by the resolution engine.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::object::RpslObject;

/// The kind of change a revision records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Modify,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Modify => write!(f, "MODIFY"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// One historical state of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Monotonic per key and source.
    pub sequence: u64,
    pub operation: Operation,
    /// Wall-clock time on the origin system.
    pub timestamp: NaiveDateTime,
    /// Object state after the change. For a DELETE this is the last state.
    pub object: RpslObject,
}

impl Revision {
    pub fn is_delete(&self) -> bool {
        self.operation == Operation::Delete
    }
}
