// crates/rdap-resolver/src/version.rs
//
// Effective revision of an object at a point in time.
//
// Revisions are grouped by their timestamp truncated to a configurable
// granularity. The newest group at or before the requested time holds the
// effective state; if it holds more than one non-delete revision the newest
// one wins and the caller gets a warning saying how many there were.
//
// Two comparisons are used and must not be mixed up:
//   - `same_group`:   truncated equality, decides group membership only
//   - `newest_first`: exact ordering, the final tie-break only

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use rdap_core::error::RdapError;
use rdap_core::object::{ObjectType, Source};
use rdap_core::revision::Revision;
use rdap_core::traits::ObjectStore;

use crate::redact::sanitize;

/// Resolution at which revision timestamps are considered simultaneous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingGranularity {
    Second,
    #[default]
    Minute,
    Hour,
}

impl GroupingGranularity {
    /// Drop every time component finer than the granularity.
    pub fn truncate(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let time = ts.time();
        let truncated = match self {
            GroupingGranularity::Second => {
                NaiveTime::from_hms_opt(time.hour(), time.minute(), time.second())
            }
            GroupingGranularity::Minute => NaiveTime::from_hms_opt(time.hour(), time.minute(), 0),
            GroupingGranularity::Hour => NaiveTime::from_hms_opt(time.hour(), 0, 0),
        };
        truncated.map(|t| ts.date().and_time(t)).unwrap_or(ts)
    }
}

/// Whether two timestamps fall into the same group.
pub fn same_group(granularity: GroupingGranularity, a: NaiveDateTime, b: NaiveDateTime) -> bool {
    granularity.truncate(a) == granularity.truncate(b)
}

/// Newest timestamp first; equal timestamps by higher sequence first.
pub fn newest_first(a: &Revision, b: &Revision) -> Ordering {
    b.timestamp
        .cmp(&a.timestamp)
        .then_with(|| b.sequence.cmp(&a.sequence))
}

/// Several revisions share the effective group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionWarning {
    pub count: usize,
    pub message: String,
}

impl VersionWarning {
    fn ambiguous(count: usize) -> Self {
        Self {
            count,
            message: format!("There are {} versions for the supplied datetime.", count),
        }
    }
}

/// The revision in effect at the requested time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveVersion {
    /// Effective revision; its object is already sanitised.
    pub revision: Revision,
    /// Number of revisions in the effective group.
    pub candidates: usize,
    /// Exact timestamp of the oldest revision in the group.
    pub earliest: NaiveDateTime,
    pub warning: Option<VersionWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VersionLookup {
    Found(EffectiveVersion),
    NotFound,
}

/// Finds historical object states in the revision log.
#[derive(Clone)]
pub struct VersionResolver {
    store: Arc<dyn ObjectStore>,
    granularity: GroupingGranularity,
}

impl VersionResolver {
    pub fn new(store: Arc<dyn ObjectStore>, granularity: GroupingGranularity) -> Self {
        Self { store, granularity }
    }

    pub fn granularity(&self) -> GroupingGranularity {
        self.granularity
    }

    /// The revision of `key` effective at `at`.
    pub async fn resolve_at(
        &self,
        object_type: ObjectType,
        key: &str,
        source: &Source,
        at: NaiveDateTime,
    ) -> Result<VersionLookup, RdapError> {
        let mut revisions = self
            .store
            .revisions_before(source, object_type, key, at)
            .await?;
        revisions.sort_by(newest_first);

        let newest = match revisions.first() {
            Some(newest) => newest,
            None => return Ok(VersionLookup::NotFound),
        };
        if newest.is_delete() {
            tracing::debug!(
                "{} '{}' ({}) deleted at {}, not found at {}",
                object_type,
                key,
                source,
                newest.timestamp,
                at
            );
            return Ok(VersionLookup::NotFound);
        }

        let group_ts = newest.timestamp;
        let mut candidates: Vec<Revision> = revisions
            .iter()
            .filter(|r| same_group(self.granularity, r.timestamp, group_ts) && !r.is_delete())
            .cloned()
            .collect();
        if candidates.is_empty() {
            return Ok(VersionLookup::NotFound);
        }
        candidates.sort_by(newest_first);

        let count = candidates.len();
        let warning = if count > 1 {
            let warning = VersionWarning::ambiguous(count);
            tracing::warn!(
                "{} '{}' ({}) at {}: {}",
                object_type,
                key,
                source,
                at,
                warning.message
            );
            Some(warning)
        } else {
            None
        };

        let earliest = candidates
            .iter()
            .map(|r| r.timestamp)
            .min()
            .unwrap_or(group_ts);
        let mut effective = candidates.swap_remove(0);
        effective.object = sanitize(effective.object);

        Ok(VersionLookup::Found(EffectiveVersion {
            revision: effective,
            candidates: count,
            earliest,
            warning,
        }))
    }

    /// Every revision up to `at`, newest first, objects sanitised.
    pub async fn history(
        &self,
        object_type: ObjectType,
        key: &str,
        source: &Source,
        at: NaiveDateTime,
    ) -> Result<Vec<Revision>, RdapError> {
        let mut revisions = self
            .store
            .revisions_before(source, object_type, key, at)
            .await?;
        revisions.sort_by(newest_first);
        Ok(revisions
            .into_iter()
            .map(|mut r| {
                r.object = sanitize(r.object);
                r
            })
            .collect())
    }
}
