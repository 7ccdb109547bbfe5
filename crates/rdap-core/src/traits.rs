// crates/rdap-core/src/traits.rs

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::RdapError;
use crate::object::{ObjectType, RpslObject, Source};
use crate::revision::Revision;

/// Read API of the registration object store.
///
/// Implemented by rdap-store (in-memory backend). The resolution engine only
/// reads; revisions are append-only and never mutated in place.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Current (non-deleted) state of an object, by normalised key.
    async fn get_object(
        &self,
        source: &Source,
        object_type: ObjectType,
        key: &str,
    ) -> Result<Option<RpslObject>, RdapError>;

    /// All revisions of an object with timestamp <= `at`, newest first.
    async fn revisions_before(
        &self,
        source: &Source,
        object_type: ObjectType,
        key: &str,
        at: NaiveDateTime,
    ) -> Result<Vec<Revision>, RdapError>;

    /// Current state of every address and AS block across all sources.
    /// Input to a full range index rebuild.
    async fn current_range_records(&self) -> Result<Vec<RpslObject>, RdapError>;

    /// Sources with at least one record.
    async fn sources(&self) -> Result<Vec<Source>, RdapError>;
}
