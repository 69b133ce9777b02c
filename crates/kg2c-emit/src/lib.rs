//! KG2c Emit: graph documents, TSV files, meta knowledge graph and staged output.

pub mod json;
pub mod meta;
pub mod output;
pub mod tsv;

pub use meta::{MetaEdge, MetaKnowledgeGraph};
pub use output::{write_atomic, Artifacts, GraphEmitter, Manifest, ManifestEntry};
