//! Consolidation types.

use kg2c_core::{Diagnostic, Edge};
use serde::{Deserialize, Serialize};

/// Stages run by [`crate::EdgeConsolidator`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidationStage {
    Rewrite,
    PruneOrphans,
    Deduplicate,
}

impl ConsolidationStage {
    pub fn all() -> &'static [ConsolidationStage] {
        &[Self::Rewrite, Self::PruneOrphans, Self::Deduplicate]
    }
}

/// Counters for one consolidation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationReport {
    #[serde(rename = "edgesIn")]
    pub edges_in: usize,
    #[serde(rename = "endpointsRewritten")]
    pub endpoints_rewritten: usize,
    #[serde(rename = "orphansPruned")]
    pub orphans_pruned: usize,
    #[serde(rename = "duplicatesMerged")]
    pub duplicates_merged: usize,
    #[serde(rename = "selfLoops")]
    pub self_loops: usize,
    #[serde(rename = "edgesOut")]
    pub edges_out: usize,
}

/// Deduplication key: (subject, relation, object, provided by).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    pub subject: String,
    pub relation: String,
    pub object: String,
    pub provided_by: Option<String>,
}

impl EdgeKey {
    pub fn of(edge: &Edge) -> Self {
        Self {
            subject: edge.subject.clone(),
            relation: edge.relation.clone(),
            object: edge.object.clone(),
            provided_by: edge.provided_by.clone(),
        }
    }
}

/// Consolidated edges plus what happened to get there.
#[derive(Debug, Clone, Default)]
pub struct Consolidated {
    /// Edges sorted by [`EdgeKey`].
    pub edges: Vec<Edge>,
    pub report: ConsolidationReport,
    pub diagnostics: Vec<Diagnostic>,
}
