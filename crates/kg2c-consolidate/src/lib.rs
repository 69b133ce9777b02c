//! Edge consolidation.
//!
//! Rewrites every edge endpoint through the identifier remap, drops edges
//! that reference unknown identifiers, and merges edges that collapse onto
//! the same (subject, relation, object, provided by) key.

pub mod pipeline;
pub mod types;

pub use pipeline::EdgeConsolidator;
pub use types::*;
