//! Raw-record adapters.
//!
//! Source records arrive as untyped key/value maps. The adapters here are
//! the only place that knows source key names; they pull the fields the
//! canonical model needs into borrowed, typed views and ignore the rest
//! (KG1 bookkeeping such as `UUID`, `seed_node_uuid`, `rtx_name` or
//! `is_defined_by` is never read, so it never reaches the canonical record).

use std::collections::BTreeMap;

use kg2c_core::{Error, RawRecord, RecordKind, Result};
use serde_json::Value;

/// Build an edge record from a `(subject id, relationship, object id)` query
/// row. Keys of the relationship payload win over the endpoints.
pub fn edge_record_from_row(subject: Value, object: Value, payload: RawRecord) -> RawRecord {
    let mut record = RawRecord::new();
    record.insert("subject".into(), subject);
    record.insert("object".into(), object);
    record.extend(payload);
    record
}

/// Typed view of a raw node record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode<'a> {
    pub id: &'a str,
    pub category_label: &'a str,
    pub iri: Option<&'a str>,
    pub name: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub symbol: Option<&'a str>,
    pub synonyms: Vec<String>,
    pub description: Option<&'a str>,
    pub publications: Vec<String>,
    pub provided_by: Option<&'a str>,
    pub update_date: Option<String>,
    pub deprecated: bool,
    pub replaced_by: Option<&'a str>,
}

impl<'a> RawNode<'a> {
    pub fn parse(record: &'a RawRecord) -> Result<Self> {
        Ok(Self {
            id: required_str(record, RecordKind::Node, &["id"])?,
            category_label: required_str(record, RecordKind::Node, &["category label", "category"])?,
            iri: optional_str(record, &["uri", "iri"]),
            name: optional_str(record, &["name"]),
            full_name: optional_str(record, &["full name", "full_name"]),
            symbol: optional_str(record, &["symbol"]),
            synonyms: record.get("synonym").map(string_list).unwrap_or_default(),
            description: optional_str(record, &["description"]),
            publications: record.get("publications").map(string_list).unwrap_or_default(),
            provided_by: optional_str(record, &["provided by", "provided_by"]),
            update_date: optional_scalar(record, &["update date", "update_date"]),
            deprecated: record
                .get("deprecated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            replaced_by: optional_str(record, &["replaced by", "replaced_by"]),
        })
    }
}

/// Typed view of a raw edge record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEdge<'a> {
    pub subject: &'a str,
    pub object: &'a str,
    pub relation_label: &'a str,
    pub provided_by: Option<&'a str>,
    pub publications: Vec<String>,
    pub publications_info: BTreeMap<String, Value>,
    pub negated: bool,
    pub update_date: Option<String>,
}

impl<'a> RawEdge<'a> {
    pub fn parse(record: &'a RawRecord) -> Result<Self> {
        Ok(Self {
            subject: required_str(record, RecordKind::Edge, &["subject"])?,
            object: required_str(record, RecordKind::Edge, &["object"])?,
            // KG2-shaped records keep the label under "edge label" and an IRI
            // under "relation"; KG1 records only have the label in "relation".
            relation_label: required_str(record, RecordKind::Edge, &["edge label", "relation"])?,
            provided_by: optional_str(record, &["provided_by", "provided by"]),
            publications: record.get("publications").map(string_list).unwrap_or_default(),
            publications_info: match record.get("publications info") {
                Some(Value::Object(map)) => map.clone().into_iter().collect(),
                _ => BTreeMap::new(),
            },
            negated: record
                .get("negated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            update_date: optional_scalar(record, &["update date", "update_date"]),
        })
    }

    /// Short key used in diagnostics.
    pub fn key(&self) -> String {
        format!("{}|{}|{}", self.subject, self.relation_label, self.object)
    }
}

fn required_str<'a>(record: &'a RawRecord, kind: RecordKind, keys: &[&str]) -> Result<&'a str> {
    optional_str(record, keys).ok_or_else(|| Error::malformed(kind, keys[keys.len() - 1]))
}

/// First non-blank string value among `keys`.
fn optional_str<'a>(record: &'a RawRecord, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Like [`optional_str`], but numbers are accepted and rendered as text.
fn optional_scalar(record: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| record.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// A comma-delimited string or an array of scalars, as a list of trimmed,
/// non-empty strings.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
