//! JSON graph documents.

use kg2c_core::{CanonicalGraph, Result};
use serde::Serialize;

/// Node fields kept in the lite document.
#[derive(Debug, Serialize)]
pub struct LiteNode<'a> {
    pub id: &'a str,
    #[serde(rename = "full name")]
    pub full_name: Option<&'a str>,
    #[serde(rename = "category label")]
    pub category_label: &'a str,
}

/// Edge fields kept in the lite document.
#[derive(Debug, Serialize)]
pub struct LiteEdge<'a> {
    pub subject: &'a str,
    pub object: &'a str,
    #[serde(rename = "edge label")]
    pub edge_label: &'a str,
    #[serde(rename = "provided by")]
    pub provided_by: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct LiteGraph<'a> {
    nodes: Vec<LiteNode<'a>>,
    edges: Vec<LiteEdge<'a>>,
}

/// Every field of every node and edge, `{"nodes": [...], "edges": [...]}`.
pub fn full_document(graph: &CanonicalGraph) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(graph)?;
    out.push(b'\n');
    Ok(out)
}

/// The reduced document for lightweight consumers.
pub fn lite_document(graph: &CanonicalGraph) -> Result<Vec<u8>> {
    let lite = LiteGraph {
        nodes: graph
            .nodes
            .iter()
            .map(|n| LiteNode {
                id: &n.id,
                full_name: n.full_name.as_deref(),
                category_label: &n.category_label,
            })
            .collect(),
        edges: graph
            .edges
            .iter()
            .map(|e| LiteEdge {
                subject: &e.subject,
                object: &e.object,
                edge_label: &e.edge_label,
                provided_by: e.provided_by.as_deref(),
            })
            .collect(),
    };
    let mut out = serde_json::to_vec_pretty(&lite)?;
    out.push(b'\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kg2c_core::{Edge, Node};
    use serde_json::Value;

    fn graph() -> CanonicalGraph {
        let mut node = Node::new("A1", "https://w3id.org/biolink/vocab/Gene", "gene");
        node.full_name = Some("BRCA1 DNA repair associated".into());
        node.synonym = vec!["BRCA1".into()];
        CanonicalGraph {
            nodes: vec![node],
            edges: vec![Edge {
                subject: "A1".into(),
                object: "A1".into(),
                edge_label: "interacts_with".into(),
                relation: "https://w3id.org/biolink/vocab/interacts_with".into(),
                relation_curie: "biolink:interacts_with".into(),
                negated: false,
                publications: vec!["PMID:1".into()],
                publications_info: Default::default(),
                provided_by: Some("https://pathwaycommons.org".into()),
                update_date: None,
            }],
        }
    }

    #[test]
    fn test_full_document_uses_kg2_field_names() {
        let doc: Value = serde_json::from_slice(&full_document(&graph()).unwrap()).unwrap();
        let node = &doc["nodes"][0];
        assert_eq!(node["category label"], "gene");
        assert_eq!(node["synonym"][0], "BRCA1");
        assert_eq!(node["replaced by"], Value::Null);
        assert_eq!(doc["edges"][0]["relation curie"], "biolink:interacts_with");
    }

    #[test]
    fn test_full_document_reads_back() {
        let g = graph();
        let back: CanonicalGraph = serde_json::from_slice(&full_document(&g).unwrap()).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn test_lite_document_subset() {
        let doc: Value = serde_json::from_slice(&lite_document(&graph()).unwrap()).unwrap();
        let node = doc["nodes"][0].as_object().unwrap();
        assert_eq!(node.len(), 3);
        assert_eq!(node["full name"], "BRCA1 DNA repair associated");
        let edge = doc["edges"][0].as_object().unwrap();
        assert_eq!(edge.len(), 4);
        assert!(edge.get("publications").is_none());
    }
}
