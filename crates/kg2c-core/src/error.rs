//! Error types for the KG2c build.

use thiserror::Error;

use crate::model::RecordKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed {kind} record: missing required field `{field}`")]
    MalformedRecord { kind: RecordKind, field: String },

    #[error("Unknown predicate: {0}")]
    UnknownPredicate(String),

    #[error("Unknown {vocabulary} term: {term}")]
    UnknownVocabularyTerm { vocabulary: String, term: String },

    #[error("Cyclic replacement chain: {}", .0.join(" -> "))]
    CyclicReplacement(Vec<String>),

    #[error("Invalid synonym clusters: {0}")]
    InvalidClusters(String),

    #[error("Normalization failed for {failed} of {total} records (threshold: {threshold})")]
    NormalizationThreshold {
        failed: usize,
        total: usize,
        threshold: String,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("TSV format error at line {line}: {detail}")]
    Tsv { line: usize, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn malformed(kind: RecordKind, field: &str) -> Self {
        Self::MalformedRecord {
            kind,
            field: field.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
