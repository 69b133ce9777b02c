//! Canonicalization engine: the full in-memory build.
//!
//! Normalizes raw records, resolves synonym clusters, rewrites and
//! deduplicates edges, and assembles the canonical graph together with its
//! audit trail and build summary. Performs no I/O.

pub mod engine;
pub mod types;

pub use engine::CanonicalizationEngine;
pub use types::*;
