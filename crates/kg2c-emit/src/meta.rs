//! Meta knowledge graph: what kinds of things the graph connects.

use std::collections::{BTreeMap, HashMap};

use kg2c_core::CanonicalGraph;
use serde::{Deserialize, Serialize};

/// One (subject category, predicate, object category) pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEdge {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaKnowledgeGraph {
    pub biolink_version: String,
    /// Category label → node count.
    pub nodes: BTreeMap<String, usize>,
    /// Sorted by subject, predicate, object.
    pub edges: Vec<MetaEdge>,
}

impl MetaKnowledgeGraph {
    pub fn summarize(graph: &CanonicalGraph, biolink_version: &str) -> Self {
        let mut nodes: BTreeMap<String, usize> = BTreeMap::new();
        let mut category: HashMap<&str, &str> = HashMap::with_capacity(graph.nodes.len());
        for n in &graph.nodes {
            *nodes.entry(n.category_label.clone()).or_default() += 1;
            category.insert(&n.id, &n.category_label);
        }

        let mut triples: BTreeMap<(&str, &str, &str), usize> = BTreeMap::new();
        for e in &graph.edges {
            let (Some(&s), Some(&o)) = (category.get(e.subject.as_str()), category.get(e.object.as_str()))
            else {
                continue;
            };
            *triples.entry((s, e.relation_curie.as_str(), o)).or_default() += 1;
        }

        Self {
            biolink_version: biolink_version.to_string(),
            nodes,
            edges: triples
                .into_iter()
                .map(|((s, p, o), count)| MetaEdge {
                    subject: s.to_string(),
                    predicate: p.to_string(),
                    object: o.to_string(),
                    count,
                })
                .collect(),
        }
    }
}
