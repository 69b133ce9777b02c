//! Record normalizer: raw source record → canonical record.

use std::collections::HashSet;

use kg2c_core::{Diagnostic, DiagnosticKind, Edge, Node, RawRecord, RecordKind, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::raw::{RawEdge, RawNode};
use crate::vocab::{biolink_local, Vocabulary};

/// A canonical record plus the non-fatal diagnostics raised producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub record: T,
    pub diagnostics: Vec<Diagnostic>,
}

/// A raw record that could not be normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordFailure {
    pub kind: RecordKind,
    /// Position in the input stream.
    pub index: usize,
    pub error: String,
}

/// Output of normalizing both record streams, in input order.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub failures: Vec<RecordFailure>,
    pub diagnostics: Vec<Diagnostic>,
}

impl NormalizedBatch {
    pub fn total_records(&self) -> usize {
        self.nodes.len() + self.edges.len() + self.failures.len()
    }

    pub fn failure_rate(&self) -> f64 {
        let total = self.total_records();
        if total == 0 {
            0.0
        } else {
            self.failures.len() as f64 / total as f64
        }
    }
}

/// Converts raw records into canonical records using a [`Vocabulary`].
pub struct Normalizer<'a> {
    vocab: &'a Vocabulary,
}

impl<'a> Normalizer<'a> {
    pub fn new(vocab: &'a Vocabulary) -> Self {
        Self { vocab }
    }

    /// Normalize one raw node record.
    pub fn normalize_node(&self, raw: &RawRecord) -> Result<Normalized<Node>> {
        let parsed = RawNode::parse(raw)?;
        let mut diagnostics = Vec::new();

        let category = self.vocab.category(parsed.category_label)?;
        if category.is_fallback() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnmappedCategory,
                parsed.id,
                format!("no category mapping for `{}`", parsed.category_label),
            ));
        }

        let iri = parsed
            .iri
            .map(String::from)
            .or_else(|| self.vocab.expand_curie(parsed.id));

        let mut synonym: Vec<String> = Vec::new();
        for s in parsed.symbol.into_iter().map(String::from).chain(parsed.synonyms) {
            if !synonym.contains(&s) {
                synonym.push(s);
            }
        }

        let provided_by = parsed.provided_by.and_then(|tag| {
            let iri = self.vocab.provenance(tag);
            if iri.is_none() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnmappedProvenance,
                    parsed.id,
                    format!("no provenance IRI for `{}`", tag),
                ));
            }
            iri
        });

        let mut node = Node::new(parsed.id, category.into_inner(), parsed.category_label);
        node.name = parsed.name.map(String::from);
        node.full_name = parsed.full_name.or(parsed.name).map(String::from);
        node.iri = iri;
        node.description = parsed.description.map(String::from);
        node.synonym = synonym;
        node.publications = dedup(parsed.publications);
        node.provided_by = provided_by;
        node.update_date = parsed.update_date;
        node.deprecated = parsed.deprecated;
        node.replaced_by = if parsed.deprecated {
            parsed.replaced_by.map(String::from)
        } else {
            None
        };

        Ok(Normalized {
            record: node,
            diagnostics,
        })
    }

    /// Normalize one raw edge record.
    pub fn normalize_edge(&self, raw: &RawRecord) -> Result<Normalized<Edge>> {
        let parsed = RawEdge::parse(raw)?;
        let mut diagnostics = Vec::new();

        let predicate = self.vocab.predicate(parsed.relation_label)?;
        if predicate.is_fallback() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnmappedPredicate,
                parsed.key(),
                format!("no predicate mapping for `{}`", parsed.relation_label),
            ));
        }
        let predicate = predicate.into_inner();

        let provided_by = match parsed.provided_by {
            Some(tag) => {
                let iri = self.vocab.provenance(tag);
                if iri.is_none() {
                    warn!("Unable to find a provenance IRI for source tag: {}", tag);
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnmappedProvenance,
                        parsed.key(),
                        format!("no provenance IRI for `{}`", tag),
                    ));
                }
                iri
            }
            None => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnmappedProvenance,
                    parsed.key(),
                    "record has no provided-by tag",
                ));
                None
            }
        };

        let edge = Edge {
            subject: parsed.subject.to_string(),
            object: parsed.object.to_string(),
            edge_label: biolink_local(parsed.relation_label)
                .unwrap_or(parsed.relation_label)
                .to_string(),
            relation: predicate.iri,
            relation_curie: predicate.curie,
            negated: parsed.negated,
            publications: dedup(parsed.publications),
            publications_info: parsed.publications_info,
            provided_by,
            update_date: parsed.update_date,
        };

        Ok(Normalized {
            record: edge,
            diagnostics,
        })
    }

    /// Normalize both record streams in parallel. Per-record failures are
    /// collected rather than returned; output keeps input order.
    pub fn normalize_batch(&self, nodes: &[RawRecord], edges: &[RawRecord]) -> NormalizedBatch {
        let node_results: Vec<Result<Normalized<Node>>> =
            nodes.par_iter().map(|r| self.normalize_node(r)).collect();
        let edge_results: Vec<Result<Normalized<Edge>>> =
            edges.par_iter().map(|r| self.normalize_edge(r)).collect();

        let mut batch = NormalizedBatch::default();
        for (index, result) in node_results.into_iter().enumerate() {
            match result {
                Ok(n) => {
                    batch.nodes.push(n.record);
                    batch.diagnostics.extend(n.diagnostics);
                }
                Err(e) => {
                    debug!("Node record {} rejected: {}", index, e);
                    batch.failures.push(RecordFailure {
                        kind: RecordKind::Node,
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }
        for (index, result) in edge_results.into_iter().enumerate() {
            match result {
                Ok(e) => {
                    batch.edges.push(e.record);
                    batch.diagnostics.extend(e.diagnostics);
                }
                Err(e) => {
                    debug!("Edge record {} rejected: {}", index, e);
                    batch.failures.push(RecordFailure {
                        kind: RecordKind::Edge,
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Normalized {} nodes and {} edges ({} failures, {} diagnostics)",
            batch.nodes.len(),
            batch.edges.len(),
            batch.failures.len(),
            batch.diagnostics.len()
        );
        batch
    }
}

/// Drop repeated entries, keeping first-seen order.
fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}
