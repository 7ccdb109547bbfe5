// crates/rdap-core/src/lib.rs
//
// rdap-core: Core types, errors, and store traits for the resolution engine.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines registration objects and their revisions, the address and
// AS-number range model, the protocol-wide error type, and the trait the
// object store collaborator implements.

pub mod error;
pub mod object;
pub mod range;
pub mod revision;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use rdap_core::RpslObject;`

// Object types
pub use object::{Attribute, ObjectType, RpslObject, Source};

// Range types
pub use range::{Interval, Namespace, RangeEntry, ResourceRange};

// Revision types
pub use revision::{Operation, Revision};

// Error type
pub use error::RdapError;

// Traits
pub use traits::ObjectStore;
