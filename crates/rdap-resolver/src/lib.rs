// crates/rdap-resolver/src/lib.rs
//
// rdap-resolver: Resolution engine over the range index and the object store.
//
// - `query`:    typed query keys and match modes
// - `handle`:   entity handle syntax
// - `sources`:  local sources and redirect base URLs
// - `resolver`: resource lookup, match policy, local vs. redirect
// - `version`:  effective revision at a point in time
// - `roles`:    related entities with role tags
// - `redact`:   removal of secrets and e-mail attributes

pub mod handle;
pub mod query;
pub mod redact;
pub mod resolver;
pub mod roles;
pub mod sources;
pub mod version;

pub use query::{MatchMode, QueryKey, QueryKind};
pub use redact::{filter_auth, filter_email, sanitize};
pub use resolver::{Redirect, Resolution, ResourceResolver};
pub use roles::{expand, Role, RoleAggregator, RoleEntity};
pub use sources::SourceRegistry;
pub use version::{
    EffectiveVersion, GroupingGranularity, VersionLookup, VersionResolver, VersionWarning,
};
