// crates/rdap-store/src/lib.rs
//
// rdap-store: Object store backends for the resolution engine.
//
// Provides an in-memory, append-only revision store implementing the
// `ObjectStore` trait, and a loader that populates it from a JSON dump of
// revisions. Persistent storage is owned by the deployment, not this crate.

pub mod dump;
pub mod memory;

// Re-export key types for ergonomic access from downstream crates.
pub use dump::{load_dump, parse_dump, DumpRecord};
pub use memory::MemoryStore;
