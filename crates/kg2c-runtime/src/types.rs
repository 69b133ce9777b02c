//! Runtime types.

use std::collections::BTreeMap;

use kg2c_consolidate::ConsolidationReport;
use kg2c_core::{CanonicalGraph, Diagnostic, DiagnosticKind, RawRecord};
use kg2c_ingest::RecordFailure;
use kg2c_resolve::{IdentifierRemap, MergeDecision, ReplacementDecision, SynonymClusters};
use serde::Serialize;

/// Stage of a canonical build, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Raw records → canonical records.
    Normalize,
    /// Synonym clusters → identifier remap and merged nodes.
    Resolve,
    /// Edge rewrite, orphan pruning, dedup.
    Consolidate,
    /// Invariant checks and final assembly.
    Assemble,
}

/// Everything a build consumes.
#[derive(Debug, Clone, Default)]
pub struct BuildInput {
    pub nodes: Vec<RawRecord>,
    pub edges: Vec<RawRecord>,
    pub clusters: SynonymClusters,
}

/// Counts reported alongside the canonical graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildSummary {
    pub raw_nodes: usize,
    pub raw_edges: usize,
    /// Records dropped by the test-mode / record-limit cap.
    pub truncated_records: usize,
    pub malformed_records: usize,
    pub normalized_nodes: usize,
    pub normalized_edges: usize,
    pub clusters: usize,
    pub merges: usize,
    pub identifiers_remapped: usize,
    pub deprecated_nodes: usize,
    pub canonical_nodes: usize,
    pub canonical_edges: usize,
    pub consolidation: ConsolidationReport,
    pub diagnostics: BTreeMap<DiagnosticKind, usize>,
}

/// Full audit trail of one build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditRecord {
    /// Every known source identifier → canonical identifier.
    pub remap: IdentifierRemap,
    pub merges: Vec<MergeDecision>,
    pub replacements: Vec<ReplacementDecision>,
    pub failures: Vec<RecordFailure>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Output of [`crate::CanonicalizationEngine::build`].
#[derive(Debug, Clone)]
pub struct CanonicalBuild {
    pub graph: CanonicalGraph,
    pub audit: AuditRecord,
    pub summary: BuildSummary,
}
