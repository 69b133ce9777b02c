//! Non-fatal build diagnostics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Class of a recoverable condition observed during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Category label had no mapping; the configured default was used.
    UnmappedCategory,
    /// Predicate label had no mapping; the configured fallback was used.
    UnmappedPredicate,
    /// Provided-by tag had no mapping; provenance left null.
    UnmappedProvenance,
    /// Two raw node records shared an identifier and were collapsed.
    DuplicateNode,
    /// A synonym cluster named no node present in the input.
    EmptyCluster,
    /// A replaced-by target is not a known identifier.
    DanglingReplacement,
    /// An edge endpoint did not resolve through the identifier remap.
    OrphanEdge,
    /// Duplicate edges disagreed on the negated flag.
    NegationConflict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Identifier of the affected record (node id, or `subject|edge label|object` for edges).
    pub record: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, record: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            record: record.into(),
            detail: detail.into(),
        }
    }
}

/// Count diagnostics by kind.
pub fn tally(diagnostics: &[Diagnostic]) -> BTreeMap<DiagnosticKind, usize> {
    let mut counts = BTreeMap::new();
    for d in diagnostics {
        *counts.entry(d.kind).or_insert(0) += 1;
    }
    counts
}
