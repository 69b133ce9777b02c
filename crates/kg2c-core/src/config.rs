//! Build configuration (`kg2c_config.json`).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Per-stream record cap applied in test mode.
pub const TEST_MODE_RECORD_LIMIT: usize = 10_000;

/// Top-level build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Version of the source knowledge graph to canonicalize (e.g. `2.7.3`).
    pub kg2_version: String,
    /// Target Biolink model version, recorded in the meta-KG output.
    pub biolink_version: String,
    /// Hand the artifacts to the external uploader once the build succeeds.
    #[serde(default)]
    pub upload_to_s3: bool,
    /// Ask the external synonymizer to rebuild the cluster index first.
    #[serde(default)]
    pub build_synonymizer: bool,
    /// Cap input volume for fast iteration.
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
}

impl BuildConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: BuildConfig = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        info!(
            "Loaded build config: kg2_version={}, biolink_version={}",
            config.kg2_version, config.biolink_version
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.kg2_version.trim().is_empty() {
            return Err(Error::Config("kg2_version must not be empty".into()));
        }
        if self.biolink_version.trim().is_empty() {
            return Err(Error::Config("biolink_version must not be empty".into()));
        }
        self.engine.validate()
    }

    /// Engine settings with the test-mode cap applied.
    pub fn effective_engine(&self) -> EngineConfig {
        let mut engine = self.engine.clone();
        if self.test_mode {
            engine.record_limit = Some(
                engine
                    .record_limit
                    .map_or(TEST_MODE_RECORD_LIMIT, |l| l.min(TEST_MODE_RECORD_LIMIT)),
            );
        }
        engine
    }

    pub fn should_build_synonymizer(&self) -> bool {
        self.build_synonymizer && !self.test_mode
    }

    pub fn should_upload(&self) -> bool {
        self.upload_to_s3 && !self.test_mode
    }
}

/// Settings for the canonicalization engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Largest tolerated fraction of raw records that fail normalization.
    /// `None` makes any failure fatal.
    #[serde(default)]
    pub max_failure_rate: Option<f64>,
    #[serde(default)]
    pub selection_policy: SelectionPolicy,
    /// Cap on each raw record stream (nodes, edges).
    #[serde(default)]
    pub record_limit: Option<usize>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self.max_failure_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::Config(format!(
                    "max_failure_rate must be within [0, 1], got {}",
                    rate
                )));
            }
        }
        if let SelectionPolicy::PreferredPrefixes { prefixes } = &self.selection_policy {
            if prefixes.is_empty() {
                return Err(Error::Config(
                    "preferred_prefixes selection policy needs at least one prefix".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Rule that picks the canonical identifier of a synonym cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Lowest identifier in byte-wise lexicographic order.
    #[default]
    LowestIdentifier,
    /// Rank by position of the curie prefix in `prefixes` (unlisted prefixes
    /// rank last), then by identifier.
    PreferredPrefixes { prefixes: Vec<String> },
}

/// Overrides and extensions for the built-in vocabulary tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Category label → category IRI.
    #[serde(default)]
    pub categories: BTreeMap<String, String>,
    /// Predicate label → explicit IRI and curie.
    #[serde(default)]
    pub predicates: BTreeMap<String, PredicateMapping>,
    /// Source provided-by tag → provenance IRI.
    #[serde(default)]
    pub provided_by: BTreeMap<String, String>,
    /// Curie prefix → IRI base used to expand node identifiers.
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
    /// Category IRI used when a label has no mapping. `None` fails the record.
    #[serde(default = "default_category_fallback")]
    pub category_fallback: Option<String>,
    /// Predicate label used when a label has no mapping. `None` fails the record.
    #[serde(default)]
    pub predicate_fallback: Option<String>,
}

pub const BIOLINK_NAMED_THING: &str = "https://w3id.org/biolink/vocab/NamedThing";

fn default_category_fallback() -> Option<String> {
    Some(BIOLINK_NAMED_THING.into())
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            categories: BTreeMap::new(),
            predicates: BTreeMap::new(),
            provided_by: BTreeMap::new(),
            prefixes: BTreeMap::new(),
            category_fallback: default_category_fallback(),
            predicate_fallback: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateMapping {
    pub iri: String,
    pub curie: String,
}
