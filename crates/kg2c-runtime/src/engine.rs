//! Build orchestration over the normalize, resolve and consolidate stages.

use kg2c_consolidate::EdgeConsolidator;
use kg2c_core::{diagnostics, CanonicalGraph, EngineConfig, Error, RawRecord, Result};
use kg2c_ingest::{NormalizedBatch, Normalizer, Vocabulary};
use kg2c_resolve::ClusterResolver;
use tracing::{debug, error, info};

use crate::types::*;

/// Runs a full canonical build over in-memory inputs.
pub struct CanonicalizationEngine<'a> {
    vocab: &'a Vocabulary,
    config: EngineConfig,
}

impl<'a> CanonicalizationEngine<'a> {
    pub fn new(vocab: &'a Vocabulary, config: EngineConfig) -> Self {
        info!(
            "Engine initialized: policy={:?}, max_failure_rate={:?}, record_limit={:?}",
            config.selection_policy, config.max_failure_rate, config.record_limit
        );
        Self { vocab, config }
    }

    /// Normalize both record streams and enforce the failure threshold.
    ///
    /// Returns the batch and the number of records dropped by the record limit.
    pub fn normalize(&self, nodes: &[RawRecord], edges: &[RawRecord]) -> Result<(NormalizedBatch, usize)> {
        let (limited_nodes, limited_edges) = (self.limit(nodes), self.limit(edges));
        let truncated = (nodes.len() - limited_nodes.len()) + (edges.len() - limited_edges.len());
        if truncated > 0 {
            info!("Record limit dropped {} raw records", truncated);
        }
        let batch = Normalizer::new(self.vocab).normalize_batch(limited_nodes, limited_edges);
        self.check_threshold(&batch)?;
        Ok((batch, truncated))
    }

    /// Run every stage. Any fatal condition aborts before a graph exists.
    pub fn build(&self, input: &BuildInput) -> Result<CanonicalBuild> {
        let mut summary = BuildSummary {
            raw_nodes: input.nodes.len(),
            raw_edges: input.edges.len(),
            clusters: input.clusters.len(),
            ..Default::default()
        };

        debug!("Stage {:?}", Stage::Normalize);
        let (batch, truncated) = self.normalize(&input.nodes, &input.edges)?;
        summary.truncated_records = truncated;
        summary.malformed_records = batch.failures.len();
        summary.normalized_nodes = batch.nodes.len();
        summary.normalized_edges = batch.edges.len();

        let mut audit = AuditRecord {
            failures: batch.failures,
            diagnostics: batch.diagnostics,
            ..Default::default()
        };

        debug!("Stage {:?}", Stage::Resolve);
        let resolution =
            ClusterResolver::new(&self.config.selection_policy).resolve(batch.nodes, &input.clusters)?;
        audit.diagnostics.extend(resolution.diagnostics);

        debug!("Stage {:?}", Stage::Consolidate);
        let consolidated = EdgeConsolidator::new(&resolution.remap).run(batch.edges);
        audit.diagnostics.extend(consolidated.diagnostics);

        debug!("Stage {:?}", Stage::Assemble);
        let graph = CanonicalGraph {
            nodes: resolution.nodes,
            edges: consolidated.edges,
        };
        check_invariants(&graph)?;

        summary.merges = resolution.merges.len();
        summary.identifiers_remapped = resolution.remap.rewritten();
        summary.deprecated_nodes = graph.nodes.iter().filter(|n| n.deprecated).count();
        summary.canonical_nodes = graph.nodes.len();
        summary.canonical_edges = graph.edges.len();
        summary.consolidation = consolidated.report;
        summary.diagnostics = diagnostics::tally(&audit.diagnostics);

        audit.remap = resolution.remap;
        audit.merges = resolution.merges;
        audit.replacements = resolution.replacements;

        info!(
            "Build complete: {} nodes, {} edges ({} merges, {} orphan edges, {} malformed records)",
            summary.canonical_nodes,
            summary.canonical_edges,
            summary.merges,
            summary.consolidation.orphans_pruned,
            summary.malformed_records
        );

        Ok(CanonicalBuild {
            graph,
            audit,
            summary,
        })
    }

    fn limit<'r>(&self, records: &'r [RawRecord]) -> &'r [RawRecord] {
        match self.config.record_limit {
            Some(limit) if records.len() > limit => &records[..limit],
            _ => records,
        }
    }

    fn check_threshold(&self, batch: &NormalizedBatch) -> Result<()> {
        let failed = batch.failures.len();
        if failed == 0 {
            return Ok(());
        }
        let total = batch.total_records();
        let exceeded = match self.config.max_failure_rate {
            Some(max) => batch.failure_rate() > max,
            None => true,
        };
        if exceeded {
            let threshold = self
                .config
                .max_failure_rate
                .map_or_else(|| "none configured".to_string(), |r| r.to_string());
            error!("Normalization failed for {} of {} records", failed, total);
            return Err(Error::NormalizationThreshold {
                failed,
                total,
                threshold,
            });
        }
        Ok(())
    }
}

/// Dangling edges or duplicate canonical ids mean a bug upstream.
fn check_invariants(graph: &CanonicalGraph) -> Result<()> {
    let duplicates = graph.duplicate_node_ids();
    if !duplicates.is_empty() {
        return Err(Error::InvariantViolation(format!(
            "duplicate canonical node ids: {}",
            duplicates.join(", ")
        )));
    }
    let dangling = graph.dangling_edges();
    if let Some(edge) = dangling.first() {
        return Err(Error::InvariantViolation(format!(
            "{} dangling edge(s), first {} -> {}",
            dangling.len(),
            edge.subject,
            edge.object
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kg2c_core::{Edge, Node};

    fn node(id: &str) -> Node {
        Node::new(id, "https://w3id.org/biolink/vocab/Protein", "protein")
    }

    fn edge(subject: &str, object: &str) -> Edge {
        Edge {
            subject: subject.into(),
            object: object.into(),
            edge_label: "interacts_with".into(),
            relation: "https://w3id.org/biolink/vocab/interacts_with".into(),
            relation_curie: "biolink:interacts_with".into(),
            negated: false,
            publications: Vec::new(),
            publications_info: Default::default(),
            provided_by: None,
            update_date: None,
        }
    }

    #[test]
    fn test_invariants_hold_for_consistent_graph() {
        let graph = CanonicalGraph {
            nodes: vec![node("A"), node("B")],
            edges: vec![edge("A", "B")],
        };
        assert!(check_invariants(&graph).is_ok());
    }

    #[test]
    fn test_dangling_edge_is_violation() {
        let graph = CanonicalGraph {
            nodes: vec![node("A")],
            edges: vec![edge("A", "B")],
        };
        assert!(matches!(check_invariants(&graph), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_duplicate_node_is_violation() {
        let graph = CanonicalGraph {
            nodes: vec![node("A"), node("A")],
            edges: Vec::new(),
        };
        assert!(matches!(check_invariants(&graph), Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_empty_input_builds_empty_graph() {
        let vocab = Vocabulary::kg1();
        let engine = CanonicalizationEngine::new(&vocab, EngineConfig::default());
        let build = engine.build(&BuildInput::default()).unwrap();
        assert!(build.graph.nodes.is_empty());
        assert!(build.graph.edges.is_empty());
        assert_eq!(build.summary.malformed_records, 0);
    }
}
