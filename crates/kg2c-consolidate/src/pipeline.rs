//! Edge consolidation execution.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use kg2c_core::{Diagnostic, DiagnosticKind, Edge};
use kg2c_resolve::{union_into, IdentifierRemap};
use tracing::{debug, info, warn};

use crate::types::*;

/// Rewrites, prunes and deduplicates edges against a fixed remap.
pub struct EdgeConsolidator<'a> {
    remap: &'a IdentifierRemap,
}

impl<'a> EdgeConsolidator<'a> {
    pub fn new(remap: &'a IdentifierRemap) -> Self {
        Self { remap }
    }

    /// Run every stage over `edges`.
    pub fn run(&self, edges: Vec<Edge>) -> Consolidated {
        let mut report = ConsolidationReport {
            edges_in: edges.len(),
            ..Default::default()
        };
        let mut diagnostics = Vec::new();

        info!("Consolidating {} edges", edges.len());

        let rewritten = self.rewrite(edges, &mut report, &mut diagnostics);
        let edges = Self::deduplicate(rewritten, &mut report, &mut diagnostics);
        report.edges_out = edges.len();

        info!(
            "Consolidation complete: rewritten={}, orphans={}, merged={}, self_loops={}, out={}",
            report.endpoints_rewritten,
            report.orphans_pruned,
            report.duplicates_merged,
            report.self_loops,
            report.edges_out
        );

        Consolidated {
            edges,
            report,
            diagnostics,
        }
    }

    /// Point both endpoints at canonical ids; drop edges with an unknown endpoint.
    fn rewrite(
        &self,
        edges: Vec<Edge>,
        report: &mut ConsolidationReport,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Edge> {
        let mut kept = Vec::with_capacity(edges.len());
        for mut edge in edges {
            let subject = self.remap.canonical(&edge.subject);
            let object = self.remap.canonical(&edge.object);
            let (Some(subject), Some(object)) = (subject, object) else {
                let missing: Vec<&str> = [&edge.subject, &edge.object]
                    .into_iter()
                    .filter(|id| !self.remap.contains(id))
                    .map(String::as_str)
                    .collect();
                debug!("Dropping orphan edge {}", edge_ref(&edge));
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::OrphanEdge,
                    edge_ref(&edge),
                    format!("unknown endpoint(s): {}", missing.join(", ")),
                ));
                report.orphans_pruned += 1;
                continue;
            };

            if subject != edge.subject {
                edge.subject = subject.to_string();
                report.endpoints_rewritten += 1;
            }
            if object != edge.object {
                edge.object = object.to_string();
                report.endpoints_rewritten += 1;
            }
            kept.push(edge);
        }
        kept
    }

    /// Merge edges sharing an [`EdgeKey`], first-seen record wins scalars.
    fn deduplicate(
        edges: Vec<Edge>,
        report: &mut ConsolidationReport,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Edge> {
        let mut by_key: BTreeMap<EdgeKey, Edge> = BTreeMap::new();
        for edge in edges {
            match by_key.entry(EdgeKey::of(&edge)) {
                Entry::Vacant(slot) => {
                    slot.insert(edge);
                }
                Entry::Occupied(mut slot) => {
                    report.duplicates_merged += 1;
                    let kept = slot.get_mut();
                    if kept.negated != edge.negated {
                        warn!("Negation conflict on {}; keeping first-seen value", edge_ref(kept));
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::NegationConflict,
                            edge_ref(kept),
                            format!("negated={} kept over negated={}", kept.negated, edge.negated),
                        ));
                    }
                    merge_edge(kept, edge);
                }
            }
        }
        report.self_loops = by_key.keys().filter(|k| k.subject == k.object).count();
        by_key.into_values().collect()
    }
}

/// Fold `other` into `kept`: lists and publication info are unioned.
fn merge_edge(kept: &mut Edge, other: Edge) {
    union_into(&mut kept.publications, other.publications);
    for (publication, info) in other.publications_info {
        kept.publications_info.entry(publication).or_insert(info);
    }
    if kept.update_date.is_none() {
        kept.update_date = other.update_date;
    }
}

fn edge_ref(edge: &Edge) -> String {
    format!("{}|{}|{}", edge.subject, edge.edge_label, edge.object)
}
