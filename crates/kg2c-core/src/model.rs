//! Canonical node and edge records.
//!
//! Field names on the wire follow the KG2 JSON format (`"category label"`,
//! `"full name"`, `"provided by"`, ...), so the same structs serialize the
//! canonical graph document and read it back.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw record in source schema: a loosely-typed key/value mapping as
/// returned by the graph query transport.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Which record stream a raw record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Node,
    Edge,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Edge => f.write_str("edge"),
        }
    }
}

/// A canonical node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "full name", default)]
    pub full_name: Option<String>,
    /// Canonical category IRI.
    pub category: String,
    /// The source vocabulary term the category was mapped from.
    #[serde(rename = "category label")]
    pub category_label: String,
    #[serde(default)]
    pub iri: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub synonym: Vec<String>,
    #[serde(default)]
    pub publications: Vec<String>,
    #[serde(rename = "provided by", default)]
    pub provided_by: Option<String>,
    #[serde(rename = "update date", default)]
    pub update_date: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(rename = "replaced by", default)]
    pub replaced_by: Option<String>,
}

impl Node {
    /// A live node with every optional field empty.
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        category_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            full_name: None,
            category: category.into(),
            category_label: category_label.into(),
            iri: None,
            description: None,
            synonym: Vec::new(),
            publications: Vec::new(),
            provided_by: None,
            update_date: None,
            deprecated: false,
            replaced_by: None,
        }
    }
}

/// A canonical edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub subject: String,
    pub object: String,
    /// Human-readable predicate, as it appeared in the source.
    #[serde(rename = "edge label")]
    pub edge_label: String,
    /// Canonical predicate IRI.
    pub relation: String,
    #[serde(rename = "relation curie")]
    pub relation_curie: String,
    #[serde(default)]
    pub negated: bool,
    #[serde(default)]
    pub publications: Vec<String>,
    #[serde(rename = "publications info", default)]
    pub publications_info: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "provided by", default)]
    pub provided_by: Option<String>,
    #[serde(rename = "update date", default)]
    pub update_date: Option<String>,
}

/// The canonical graph: deduplicated nodes and edges over canonical ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl CanonicalGraph {
    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Edges whose subject or object is not a node of this graph.
    pub fn dangling_edges(&self) -> Vec<&Edge> {
        let ids = self.node_ids();
        self.edges
            .iter()
            .filter(|e| !ids.contains(e.subject.as_str()) || !ids.contains(e.object.as_str()))
            .collect()
    }

    /// Node ids that occur on more than one node.
    pub fn duplicate_node_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                dupes.push(node.id.as_str());
            }
        }
        dupes
    }
}
