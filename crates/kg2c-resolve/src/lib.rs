//! Synonym cluster resolution.
//!
//! Turns an externally supplied partition of node identifiers into an
//! [`IdentifierRemap`] and one merged node per cluster. Selection of the
//! canonical identifier is a deterministic total order, so the same input
//! always produces the same canonical graph.

pub mod cluster;
pub mod merge;
pub mod replacement;
pub mod types;

pub use cluster::ClusterResolver;
pub use merge::{merge_nodes, union_into, MergedNode};
pub use types::*;
