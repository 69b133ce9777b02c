//! Deprecation replacement chains over canonical identifiers.

use std::collections::{BTreeMap, HashMap, HashSet};

use kg2c_core::{Diagnostic, DiagnosticKind, Error, Result};
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::merge::MergedNode;
use crate::types::{IdentifierRemap, ReplacementDecision};

/// Settle `deprecated` / `replaced_by` on every canonical node.
///
/// Each deprecated member's raw replacement chain is walked over source
/// identifiers first. A chain that reaches a live member of the member's
/// own cluster is absorbed by the merge and does not deprecate the
/// canonical node. Any other deprecation points at the canonical node of
/// the member's replacement, and chains are followed until a live node is
/// reached. A replacement cycle, including a node replaced by itself, is
/// fatal.
pub fn resolve_replacements(
    nodes: &mut BTreeMap<String, MergedNode>,
    remap: &IdentifierRemap,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<ReplacementDecision>> {
    let targets = replacement_targets(nodes, remap, diagnostics)?;

    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for (id, target) in &targets {
        graph.add_node(id.as_str());
        if let Some(t) = target {
            graph.add_edge(id.as_str(), t.as_str(), ());
        }
    }
    for component in tarjan_scc(&graph) {
        if component.len() > 1 {
            let mut cycle: Vec<String> = component.iter().map(|s| s.to_string()).collect();
            cycle.sort();
            return Err(Error::CyclicReplacement(cycle));
        }
    }

    let mut decisions = Vec::with_capacity(targets.len());
    for (id, target) in &targets {
        let mut chain = Vec::new();
        let mut current = target.clone();
        let mut live = None;
        while let Some(next) = current {
            chain.push(next.clone());
            match targets.get(&next) {
                Some(further) => current = further.clone(),
                None => {
                    live = Some(next);
                    current = None;
                }
            }
        }
        decisions.push(ReplacementDecision {
            node: id.clone(),
            replaced_by: live,
            chain,
        });
    }

    for (id, merged) in nodes.iter_mut() {
        merged.node.deprecated = targets.contains_key(id);
        merged.node.replaced_by = None;
    }
    for decision in &decisions {
        if let Some(merged) = nodes.get_mut(&decision.node) {
            merged.node.replaced_by = decision.replaced_by.clone();
        }
    }

    Ok(decisions)
}

/// Canonical id -> first replacement target outside its own cluster, for
/// every canonical node that stays deprecated.
fn replacement_targets(
    nodes: &BTreeMap<String, MergedNode>,
    remap: &IdentifierRemap,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<BTreeMap<String, Option<String>>> {
    let raw: HashMap<&str, Option<&str>> = nodes
        .values()
        .flat_map(|m| m.deprecations.iter())
        .map(|(member, replaced_by)| (member.as_str(), replaced_by.as_deref()))
        .collect();

    let mut targets: BTreeMap<String, Option<String>> = BTreeMap::new();
    for (id, merged) in nodes {
        let mut deprecated = false;
        let mut target: Option<String> = None;
        for (member, replaced_by) in &merged.deprecations {
            let end = chain_end(member, &raw)?;
            if end.is_some_and(|e| remap.canonical(e) == Some(id.as_str())) {
                debug!("Deprecation of {} absorbed into {}", member, id);
                continue;
            }
            deprecated = true;
            let Some(r) = replaced_by else {
                continue;
            };
            match remap.canonical(r) {
                Some(t) if t == id => {}
                Some(t) => {
                    if target.is_none() {
                        target = Some(t.to_string());
                    }
                }
                None => diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DanglingReplacement,
                    member.as_str(),
                    format!("replaced-by target `{}` is not a known identifier", r),
                )),
            }
        }
        if deprecated {
            targets.insert(id.clone(), target);
        }
    }
    Ok(targets)
}

/// Follow `member`'s raw replacement chain over source identifiers.
///
/// Returns the first identifier on the chain that is not deprecated, or
/// `None` when the chain stops at a deprecated identifier with no
/// replacement.
fn chain_end<'a>(member: &'a str, raw: &HashMap<&'a str, Option<&'a str>>) -> Result<Option<&'a str>> {
    let mut path = vec![member];
    let mut seen: HashSet<&str> = HashSet::from([member]);
    let mut current = member;
    loop {
        let Some(&replaced_by) = raw.get(current) else {
            return Ok(Some(current));
        };
        let Some(next) = replaced_by else {
            return Ok(None);
        };
        if !seen.insert(next) {
            let start = path.iter().position(|id| *id == next).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|s| s.to_string()).collect();
            cycle.sort();
            return Err(Error::CyclicReplacement(cycle));
        }
        path.push(next);
        current = next;
    }
}
