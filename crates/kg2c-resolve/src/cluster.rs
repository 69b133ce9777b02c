//! Synonym cluster resolver: canonical identifier selection and node merge.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use kg2c_core::{Diagnostic, DiagnosticKind, Error, Node, Result, SelectionPolicy};
use tracing::{debug, info};

use crate::merge::{merge_nodes, MergedNode};
use crate::replacement::resolve_replacements;
use crate::types::*;

/// One cluster after validation: members present in the node set, in
/// precedence order, and identifiers that only exist as aliases.
#[derive(Debug, Clone)]
struct Assignment {
    canonical: String,
    members: Vec<String>,
    aliases: Vec<String>,
}

/// Resolves an externally supplied cluster partition into an
/// [`IdentifierRemap`] and a merged, canonical node set.
pub struct ClusterResolver<'a> {
    policy: &'a SelectionPolicy,
}

impl<'a> ClusterResolver<'a> {
    pub fn new(policy: &'a SelectionPolicy) -> Self {
        Self { policy }
    }

    /// Total order over identifiers; the first member of a cluster wins.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self.policy {
            SelectionPolicy::LowestIdentifier => a.cmp(b),
            SelectionPolicy::PreferredPrefixes { prefixes } => {
                let rank = |id: &str| {
                    id.split_once(':')
                        .and_then(|(prefix, _)| prefixes.iter().position(|p| p == prefix))
                        .unwrap_or(prefixes.len())
                };
                rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
            }
        }
    }

    /// Resolve `clusters` over `nodes`.
    pub fn resolve(&self, nodes: Vec<Node>, clusters: &SynonymClusters) -> Result<Resolution> {
        let mut diagnostics = Vec::new();
        let mut by_id = collapse_duplicates(nodes, &mut diagnostics);
        let assignments = self.assign(&by_id, clusters, &mut diagnostics)?;

        let mut remap: BTreeMap<String, String> = BTreeMap::new();
        for a in &assignments {
            for id in a.members.iter().chain(&a.aliases) {
                remap.insert(id.clone(), a.canonical.clone());
            }
        }
        for id in by_id.keys() {
            remap.entry(id.clone()).or_insert_with(|| id.clone());
        }
        let remap = IdentifierRemap::from(remap);

        let mut merged: BTreeMap<String, MergedNode> = BTreeMap::new();
        let mut merges = Vec::new();
        for a in assignments {
            let members: Vec<Node> = a.members.iter().filter_map(|id| by_id.remove(id)).collect();
            let Some(node) = merge_nodes(&a.canonical, members) else {
                continue;
            };
            if a.members.len() > 1 || !a.aliases.is_empty() {
                debug!(
                    "Merged {} members (+{} aliases) into {}",
                    a.members.len(),
                    a.aliases.len(),
                    a.canonical
                );
                merges.push(MergeDecision {
                    canonical: a.canonical.clone(),
                    members: a.members,
                    aliases: a.aliases,
                    field_sources: node.field_sources.clone(),
                });
            }
            merged.insert(a.canonical, node);
        }
        for (id, node) in by_id {
            merged.insert(id, MergedNode::single(node));
        }

        let replacements = resolve_replacements(&mut merged, &remap, &mut diagnostics)?;
        let nodes: Vec<Node> = merged.into_values().map(|m| m.node).collect();

        info!(
            "Resolved {} clusters: {} canonical nodes, {} identifiers remapped, {} merges, {} deprecated",
            clusters.len(),
            nodes.len(),
            remap.rewritten(),
            merges.len(),
            replacements.len()
        );

        Ok(Resolution {
            remap,
            nodes,
            merges,
            replacements,
            diagnostics,
        })
    }

    /// Validate the partition and pick each cluster's canonical identifier.
    fn assign(
        &self,
        nodes: &BTreeMap<String, Node>,
        clusters: &SynonymClusters,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Vec<Assignment>> {
        let mut owner: HashMap<&str, usize> = HashMap::new();
        let mut assignments = Vec::with_capacity(clusters.len());

        for (index, group) in clusters.iter().enumerate() {
            let mut ids: Vec<&str> = Vec::with_capacity(group.len());
            for id in group {
                match owner.get(id.as_str()) {
                    Some(&other) if other != index => {
                        return Err(Error::InvalidClusters(format!(
                            "identifier `{}` appears in clusters {} and {}",
                            id, other, index
                        )));
                    }
                    Some(_) => continue,
                    None => {
                        owner.insert(id.as_str(), index);
                        ids.push(id.as_str());
                    }
                }
            }

            let (mut members, mut aliases): (Vec<&str>, Vec<&str>) =
                ids.into_iter().partition(|id| nodes.contains_key(*id));
            members.sort_by(|a, b| self.compare(a, b));
            aliases.sort_by(|a, b| self.compare(a, b));

            let Some(canonical) = members.first() else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::EmptyCluster,
                    aliases.join(","),
                    format!("cluster {} names no node in the input", index),
                ));
                continue;
            };

            assignments.push(Assignment {
                canonical: canonical.to_string(),
                members: members.iter().map(|s| s.to_string()).collect(),
                aliases: aliases.iter().map(|s| s.to_string()).collect(),
            });
        }

        Ok(assignments)
    }
}

/// Index nodes by id, merging records that share an id in input order.
fn collapse_duplicates(nodes: Vec<Node>, diagnostics: &mut Vec<Diagnostic>) -> BTreeMap<String, Node> {
    let mut by_id: BTreeMap<String, Node> = BTreeMap::new();
    for node in nodes {
        match by_id.remove(&node.id) {
            Some(existing) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateNode,
                    node.id.as_str(),
                    "multiple raw records share this identifier; merged in input order",
                ));
                let id = node.id.clone();
                if let Some(m) = merge_nodes(&id, vec![existing, node]) {
                    by_id.insert(id, m.node);
                }
            }
            None => {
                by_id.insert(node.id.clone(), node);
            }
        }
    }
    by_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, symbol: &str) -> Node {
        let mut n = Node::new(id, "https://w3id.org/biolink/vocab/NamedThing", "gene_ontology:gene");
        n.synonym = vec![symbol.to_string()];
        n
    }

    fn clusters(groups: &[&[&str]]) -> SynonymClusters {
        groups.iter().map(|g| g.to_vec()).collect()
    }

    #[test]
    fn test_scenario_lowest_identifier() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let nodes = vec![node("A2", "BRCA1-syn"), node("A1", "BRCA1"), node("B1", "TP53")];
        let res = resolver.resolve(nodes, &clusters(&[&["A2", "A1"]])).unwrap();

        assert_eq!(res.nodes.len(), 2);
        assert_eq!(res.nodes[0].id, "A1");
        assert_eq!(res.nodes[0].synonym, vec!["BRCA1", "BRCA1-syn"]);
        assert_eq!(res.remap.canonical("A2"), Some("A1"));
        assert_eq!(res.remap.canonical("A1"), Some("A1"));
        assert_eq!(res.remap.canonical("B1"), Some("B1"));
        assert_eq!(res.merges.len(), 1);
        assert_eq!(res.merges[0].members, vec!["A1", "A2"]);
    }

    #[test]
    fn test_preferred_prefix_policy() {
        let policy = SelectionPolicy::PreferredPrefixes {
            prefixes: vec!["NCBIGene".into(), "UniProtKB".into()],
        };
        let resolver = ClusterResolver::new(&policy);
        let nodes = vec![
            node("UniProtKB:P38398", "BRCA1"),
            node("NCBIGene:672", "BRCA1"),
            node("HGNC:1100", "BRCA1"),
        ];
        let res = resolver
            .resolve(nodes, &clusters(&[&["UniProtKB:P38398", "HGNC:1100", "NCBIGene:672"]]))
            .unwrap();
        assert_eq!(res.nodes.len(), 1);
        assert_eq!(res.nodes[0].id, "NCBIGene:672");
        assert_eq!(
            res.merges[0].members,
            vec!["NCBIGene:672", "UniProtKB:P38398", "HGNC:1100"]
        );
    }

    #[test]
    fn test_selection_is_independent_of_input_order() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let forward = resolver
            .resolve(
                vec![node("C", "c"), node("B", "b"), node("A", "a")],
                &clusters(&[&["C", "B", "A"]]),
            )
            .unwrap();
        let backward = resolver
            .resolve(
                vec![node("A", "a"), node("B", "b"), node("C", "c")],
                &clusters(&[&["A", "B", "C"]]),
            )
            .unwrap();
        assert_eq!(forward.nodes, backward.nodes);
        assert_eq!(forward.remap, backward.remap);
    }

    #[test]
    fn test_overlapping_clusters_rejected() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let nodes = vec![node("A", "a"), node("B", "b"), node("C", "c")];
        let err = resolver
            .resolve(nodes, &clusters(&[&["A", "B"], &["B", "C"]]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidClusters(_)));
    }

    #[test]
    fn test_singleton_cluster_passes_through() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let original = node("A", "a");
        let res = resolver
            .resolve(vec![original.clone()], &clusters(&[&["A"]]))
            .unwrap();
        assert_eq!(res.nodes, vec![original]);
        assert!(res.merges.is_empty());
        assert_eq!(res.remap.canonical("A"), Some("A"));
    }

    #[test]
    fn test_absent_members_become_aliases() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let res = resolver
            .resolve(vec![node("B", "b")], &clusters(&[&["A", "B"]]))
            .unwrap();
        assert_eq!(res.nodes.len(), 1);
        assert_eq!(res.nodes[0].id, "B");
        assert_eq!(res.remap.canonical("A"), Some("B"));
        assert_eq!(res.merges[0].aliases, vec!["A"]);
    }

    #[test]
    fn test_empty_cluster_is_diagnostic() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let res = resolver
            .resolve(vec![node("B", "b")], &clusters(&[&["X", "Y"]]))
            .unwrap();
        assert!(!res.remap.contains("X"));
        assert_eq!(res.diagnostics.len(), 1);
        assert_eq!(res.diagnostics[0].kind, DiagnosticKind::EmptyCluster);
    }

    #[test]
    fn test_duplicate_raw_ids_collapse() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let mut second = node("A", "alpha");
        second.description = Some("second record".into());
        let res = resolver
            .resolve(vec![node("A", "a"), second], &SynonymClusters::default())
            .unwrap();
        assert_eq!(res.nodes.len(), 1);
        assert_eq!(res.nodes[0].synonym, vec!["a", "alpha"]);
        assert_eq!(res.nodes[0].description.as_deref(), Some("second record"));
        assert_eq!(res.diagnostics[0].kind, DiagnosticKind::DuplicateNode);
    }

    #[test]
    fn test_merged_deprecation_points_to_live_canonical() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let mut old = node("OLD", "o");
        old.deprecated = true;
        old.replaced_by = Some("B2".into());
        let nodes = vec![old, node("B1", "b"), node("B2", "b2")];
        let res = resolver
            .resolve(nodes, &clusters(&[&["B1", "B2"]]))
            .unwrap();
        let old = res.nodes.iter().find(|n| n.id == "OLD").unwrap();
        assert!(old.deprecated);
        assert_eq!(old.replaced_by.as_deref(), Some("B1"));
        let b1 = res.nodes.iter().find(|n| n.id == "B1").unwrap();
        assert!(!b1.deprecated);
    }

    #[test]
    fn test_replacement_cycle_within_cluster_is_fatal() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let mut a1 = node("A1", "a1");
        a1.deprecated = true;
        a1.replaced_by = Some("A2".into());
        let mut a2 = node("A2", "a2");
        a2.deprecated = true;
        a2.replaced_by = Some("A1".into());
        let err = resolver
            .resolve(vec![a1, a2], &clusters(&[&["A1", "A2"]]))
            .unwrap_err();
        assert!(matches!(err, Error::CyclicReplacement(ids) if ids == vec!["A1", "A2"]));
    }

    #[test]
    fn test_self_replacement_is_fatal() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let mut a = node("A", "a");
        a.deprecated = true;
        a.replaced_by = Some("A".into());
        let err = resolver
            .resolve(vec![a], &SynonymClusters::default())
            .unwrap_err();
        assert!(matches!(err, Error::CyclicReplacement(_)));
    }

    #[test]
    fn test_member_replaced_by_live_sibling_is_absorbed() {
        let policy = SelectionPolicy::LowestIdentifier;
        let resolver = ClusterResolver::new(&policy);
        let mut a2 = node("A2", "a2");
        a2.deprecated = true;
        a2.replaced_by = Some("A1".into());
        let res = resolver
            .resolve(vec![node("A1", "a1"), a2], &clusters(&[&["A1", "A2"]]))
            .unwrap();
        assert_eq!(res.nodes.len(), 1);
        assert!(!res.nodes[0].deprecated);
        assert!(res.replacements.is_empty());
    }
}
