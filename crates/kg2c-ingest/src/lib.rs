//! KG2c Ingest: vocabulary mapping, raw-record adapters and record normalization.

pub mod normalize;
pub mod raw;
pub mod vocab;

pub use normalize::{Normalized, NormalizedBatch, Normalizer, RecordFailure};
pub use raw::{edge_record_from_row, RawEdge, RawNode};
pub use vocab::{Lookup, PredicateTerm, Vocabulary};
