//! Attribute merge for cluster members.
//!
//! Members are supplied in precedence order. List fields are a deduplicated
//! union in first-seen order; scalar fields take the first non-null value.

use std::collections::{BTreeMap, HashSet};

use kg2c_core::Node;

/// A merged node plus the bookkeeping the later resolution steps need.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedNode {
    pub node: Node,
    /// Scalar field → member id that supplied it.
    pub field_sources: BTreeMap<String, String>,
    /// `(member id, replaced by)` for every deprecated member.
    pub deprecations: Vec<(String, Option<String>)>,
}

impl MergedNode {
    /// Wrap an unmerged node.
    pub fn single(node: Node) -> Self {
        let deprecations = if node.deprecated {
            vec![(node.id.clone(), node.replaced_by.clone())]
        } else {
            Vec::new()
        };
        Self {
            node,
            field_sources: BTreeMap::new(),
            deprecations,
        }
    }
}

/// Merge `members` (precedence order) into one node with id `canonical`.
/// Returns `None` when there are no members.
pub fn merge_nodes(canonical: &str, members: Vec<Node>) -> Option<MergedNode> {
    let mut field_sources = BTreeMap::new();
    let mut deprecations = Vec::new();

    let mut iter = members.into_iter();
    let first = iter.next()?;

    field_sources.insert("category".to_string(), first.id.clone());
    let mut merged = first.clone();
    merged.id = canonical.to_string();
    record_scalar_sources(&first, &mut field_sources);
    if first.deprecated {
        deprecations.push((first.id.clone(), first.replaced_by.clone()));
    }

    for member in iter {
        take_scalar(&mut merged.name, &member.name, "name", &member.id, &mut field_sources);
        take_scalar(&mut merged.full_name, &member.full_name, "full name", &member.id, &mut field_sources);
        take_scalar(&mut merged.iri, &member.iri, "iri", &member.id, &mut field_sources);
        take_scalar(&mut merged.description, &member.description, "description", &member.id, &mut field_sources);
        take_scalar(&mut merged.provided_by, &member.provided_by, "provided by", &member.id, &mut field_sources);
        take_scalar(&mut merged.update_date, &member.update_date, "update date", &member.id, &mut field_sources);
        union_into(&mut merged.synonym, member.synonym);
        union_into(&mut merged.publications, member.publications);
        if member.deprecated {
            merged.deprecated = true;
            if merged.replaced_by.is_none() {
                merged.replaced_by = member.replaced_by.clone();
            }
            deprecations.push((member.id, member.replaced_by));
        }
    }

    Some(MergedNode {
        node: merged,
        field_sources,
        deprecations,
    })
}

fn record_scalar_sources(node: &Node, sources: &mut BTreeMap<String, String>) {
    let fields: [(&str, bool); 6] = [
        ("name", node.name.is_some()),
        ("full name", node.full_name.is_some()),
        ("iri", node.iri.is_some()),
        ("description", node.description.is_some()),
        ("provided by", node.provided_by.is_some()),
        ("update date", node.update_date.is_some()),
    ];
    for (field, present) in fields {
        if present {
            sources.insert(field.to_string(), node.id.clone());
        }
    }
}

fn take_scalar(
    slot: &mut Option<String>,
    candidate: &Option<String>,
    field: &str,
    member: &str,
    sources: &mut BTreeMap<String, String>,
) {
    if slot.is_none() {
        if let Some(value) = candidate {
            *slot = Some(value.clone());
            sources.insert(field.to_string(), member.to_string());
        }
    }
}

/// Append the items of `extra` not already in `target`, keeping
/// first-seen order.
pub fn union_into(target: &mut Vec<String>, extra: Vec<String>) {
    if extra.is_empty() {
        return;
    }
    let mut seen: HashSet<String> = target.iter().cloned().collect();
    for item in extra {
        if seen.insert(item.clone()) {
            target.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> Node {
        Node::new(id, "https://w3id.org/biolink/vocab/Protein", "protein")
    }

    #[test]
    fn test_merge_unions_lists() {
        let mut a = node("A1");
        a.synonym = vec!["BRCA1".into(), "shared".into()];
        a.publications = vec!["PMID:1".into()];
        let mut b = node("A2");
        b.synonym = vec!["shared".into(), "BRCA1-syn".into()];
        b.publications = vec!["PMID:2".into(), "PMID:1".into()];

        let merged = merge_nodes("A1", vec![a, b]).unwrap();
        assert_eq!(merged.node.id, "A1");
        assert_eq!(merged.node.synonym, vec!["BRCA1", "shared", "BRCA1-syn"]);
        assert_eq!(merged.node.publications, vec!["PMID:1", "PMID:2"]);
    }

    #[test]
    fn test_merge_first_non_null_scalar_wins() {
        let a = node("A1");
        let mut b = node("A2");
        b.description = Some("from A2".into());
        b.name = Some("second".into());
        let mut c = node("A3");
        c.description = Some("from A3".into());
        c.name = Some("third".into());

        let merged = merge_nodes("A1", vec![a, b, c]).unwrap();
        assert_eq!(merged.node.description.as_deref(), Some("from A2"));
        assert_eq!(merged.node.name.as_deref(), Some("second"));
        assert_eq!(merged.field_sources["description"], "A2");
        assert_eq!(merged.field_sources["category"], "A1");
    }

    #[test]
    fn test_merge_keeps_canonical_scalars() {
        let mut a = node("A1");
        a.iri = Some("http://example.org/A1".into());
        let mut b = node("A2");
        b.iri = Some("http://example.org/A2".into());
        let merged = merge_nodes("A1", vec![a, b]).unwrap();
        assert_eq!(merged.node.iri.as_deref(), Some("http://example.org/A1"));
        assert_eq!(merged.field_sources["iri"], "A1");
    }

    #[test]
    fn test_merge_tracks_deprecations() {
        let a = node("A1");
        let mut b = node("A2");
        b.deprecated = true;
        b.replaced_by = Some("A1".into());
        let merged = merge_nodes("A1", vec![a, b]).unwrap();
        assert!(merged.node.deprecated);
        assert_eq!(merged.deprecations, vec![("A2".to_string(), Some("A1".to_string()))]);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_nodes("A1", Vec::new()).is_none());
    }

    #[test]
    fn test_single_records_own_deprecation() {
        let mut a = node("A1");
        a.deprecated = true;
        let single = MergedNode::single(a);
        assert_eq!(single.deprecations, vec![("A1".to_string(), None)]);
    }

    #[test]
    fn test_union_into_large_lists_keeps_first_seen_order() {
        let mut target: Vec<String> = (0..20_000).map(|i| format!("PMID:{}", i)).collect();
        let extra: Vec<String> = (10_000..40_000).rev().map(|i| format!("PMID:{}", i)).collect();
        union_into(&mut target, extra);
        assert_eq!(target.len(), 40_000);
        assert_eq!(target[19_999], "PMID:19999");
        assert_eq!(target[20_000], "PMID:39999");
        assert_eq!(target[39_999], "PMID:20000");
    }

    #[test]
    fn test_union_into_drops_repeats_within_extra() {
        let mut target = vec!["a".to_string()];
        union_into(&mut target, vec!["b".into(), "a".into(), "b".into(), "c".into()]);
        assert_eq!(target, vec!["a", "b", "c"]);
    }
}
