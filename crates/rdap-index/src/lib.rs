// crates/rdap-index/src/lib.rs
//
// rdap-index: Hierarchical range index for address and AS-number blocks.
//
// A `RangeIndex` is an immutable snapshot answering exact, most-specific and
// less-specific containment queries. `IndexBuilder` produces snapshots from a
// full scan of current records, and `IndexHandle` publishes them with a
// single atomic swap while readers keep whatever snapshot they loaded.

pub mod builder;
pub mod handle;
pub mod tree;

pub use builder::IndexBuilder;
pub use handle::{IndexHandle, RebuildReport};
pub use tree::RangeIndex;
