//! KG2c Core: canonical graph model, build configuration, errors and diagnostics.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;

pub use config::{
    BuildConfig, EngineConfig, PredicateMapping, SelectionPolicy, VocabularyConfig,
    BIOLINK_NAMED_THING, TEST_MODE_RECORD_LIMIT,
};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use model::{CanonicalGraph, Edge, Node, RawRecord, RecordKind};
