//! Resolver types.

use std::collections::{BTreeMap, BTreeSet};

use kg2c_core::{Diagnostic, Node};
use serde::{Deserialize, Serialize};

/// Externally supplied partition of node identifiers into synonym clusters.
///
/// Serialized as a JSON array of arrays of identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymClusters(Vec<Vec<String>>);

impl SynonymClusters {
    pub fn new(groups: Vec<Vec<String>>) -> Self {
        Self(groups)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<String>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<Vec<S>> for SynonymClusters {
    fn from_iter<I: IntoIterator<Item = Vec<S>>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|g| g.into_iter().map(Into::into).collect())
                .collect(),
        )
    }
}

/// Mapping from every known source identifier to its canonical identifier.
///
/// Built once by the resolver and never mutated afterwards. Every canonical
/// identifier maps to itself, so applying the remap is idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdentifierRemap(BTreeMap<String, String>);

impl IdentifierRemap {
    /// Canonical identifier for `id`, if `id` is known.
    pub fn canonical(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The distinct canonical identifiers.
    pub fn canonical_ids(&self) -> BTreeSet<&str> {
        self.0.values().map(String::as_str).collect()
    }

    /// Identifiers whose canonical identifier differs from themselves.
    pub fn rewritten(&self) -> usize {
        self.0.iter().filter(|(k, v)| k != v).count()
    }
}

impl FromIterator<(String, String)> for IdentifierRemap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for IdentifierRemap {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Audit entry for one multi-member cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeDecision {
    pub canonical: String,
    /// Members present in the node set, in precedence order.
    pub members: Vec<String>,
    /// Cluster identifiers with no node of their own, remapped to `canonical`.
    pub aliases: Vec<String>,
    /// Scalar field → member that supplied its value.
    pub field_sources: BTreeMap<String, String>,
}

/// Audit entry for one deprecated canonical node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementDecision {
    pub node: String,
    /// Live canonical node the chain ends at, if any.
    pub replaced_by: Option<String>,
    /// Canonical identifiers visited after `node`.
    pub chain: Vec<String>,
}

/// Output of cluster resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub remap: IdentifierRemap,
    /// Canonical nodes, sorted by identifier.
    pub nodes: Vec<Node>,
    pub merges: Vec<MergeDecision>,
    pub replacements: Vec<ReplacementDecision>,
    pub diagnostics: Vec<Diagnostic>,
}
