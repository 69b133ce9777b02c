//! Tab-separated node and edge files.
//!
//! Header and data live in separate files. Cells are escaped so that every
//! file can be read back into the exact records it was written from:
//!
//! | value                 | cell                 |
//! |-----------------------|----------------------|
//! | null                  | `\N`                 |
//! | `\` TAB LF CR `ǂ`     | `\\` `\t` `\n` `\r` `\d` |
//! | list                  | elements joined by `ǂ` |
//! | empty list            | empty cell           |
//! | empty list element    | `\e`                 |
//! | `publications info`   | compact JSON, escaped |

use std::collections::BTreeMap;

use kg2c_core::{Edge, Error, Node, Result};

/// Neo4j array delimiter used between list elements.
pub const LIST_DELIMITER: char = 'ǂ';
const NULL: &str = "\\N";
const EMPTY_ELEMENT: &str = "\\e";

pub const NODE_COLUMNS: [&str; 13] = [
    "id",
    "name",
    "full name",
    "category",
    "category label",
    "iri",
    "description",
    "synonym",
    "publications",
    "provided by",
    "update date",
    "deprecated",
    "replaced by",
];

pub const EDGE_COLUMNS: [&str; 10] = [
    "subject",
    "object",
    "edge label",
    "relation",
    "relation curie",
    "negated",
    "publications",
    "publications info",
    "provided by",
    "update date",
];

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            LIST_DELIMITER => out.push_str("\\d"),
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`]. Returns the offending sequence on failure.
pub fn unescape(cell: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(cell.len());
    let mut chars = cell.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('d') => out.push(LIST_DELIMITER),
            Some(other) => return Err(format!("\\{}", other)),
            None => return Err("trailing \\".into()),
        }
    }
    Ok(out)
}

fn optional_cell(value: Option<&str>) -> String {
    value.map_or_else(|| NULL.to_string(), escape)
}

fn list_cell(values: &[String]) -> String {
    values
        .iter()
        .map(|v| if v.is_empty() { EMPTY_ELEMENT.to_string() } else { escape(v) })
        .collect::<Vec<_>>()
        .join(&LIST_DELIMITER.to_string())
}

fn header(columns: &[&str]) -> String {
    let mut line = columns.join("\t");
    line.push('\n');
    line
}

pub fn nodes_header() -> String {
    header(&NODE_COLUMNS)
}

pub fn edges_header() -> String {
    header(&EDGE_COLUMNS)
}

/// One row per node, no header.
pub fn write_nodes(nodes: &[Node]) -> String {
    let mut out = String::new();
    for n in nodes {
        let row = [
            escape(&n.id),
            optional_cell(n.name.as_deref()),
            optional_cell(n.full_name.as_deref()),
            escape(&n.category),
            escape(&n.category_label),
            optional_cell(n.iri.as_deref()),
            optional_cell(n.description.as_deref()),
            list_cell(&n.synonym),
            list_cell(&n.publications),
            optional_cell(n.provided_by.as_deref()),
            optional_cell(n.update_date.as_deref()),
            n.deprecated.to_string(),
            optional_cell(n.replaced_by.as_deref()),
        ];
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

/// One row per edge, no header.
pub fn write_edges(edges: &[Edge]) -> Result<String> {
    let mut out = String::new();
    for e in edges {
        let info = serde_json::to_string(&e.publications_info)?;
        let row = [
            escape(&e.subject),
            escape(&e.object),
            escape(&e.edge_label),
            escape(&e.relation),
            escape(&e.relation_curie),
            e.negated.to_string(),
            list_cell(&e.publications),
            escape(&info),
            optional_cell(e.provided_by.as_deref()),
            optional_cell(e.update_date.as_deref()),
        ];
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    Ok(out)
}

/// Cursor over the cells of one data row.
struct Row<'a> {
    line: usize,
    cells: Vec<&'a str>,
}

impl<'a> Row<'a> {
    fn split(line: usize, text: &'a str, width: usize) -> Result<Self> {
        let cells: Vec<&str> = text.split('\t').collect();
        if cells.len() != width {
            return Err(Error::Tsv {
                line,
                detail: format!("expected {} cells, found {}", width, cells.len()),
            });
        }
        Ok(Self { line, cells })
    }

    fn err(&self, column: usize, detail: impl std::fmt::Display) -> Error {
        Error::Tsv {
            line: self.line,
            detail: format!("column {}: {}", column + 1, detail),
        }
    }

    fn string(&self, i: usize) -> Result<String> {
        unescape(self.cells[i]).map_err(|e| self.err(i, format!("bad escape {}", e)))
    }

    fn optional(&self, i: usize) -> Result<Option<String>> {
        if self.cells[i] == NULL {
            Ok(None)
        } else {
            self.string(i).map(Some)
        }
    }

    fn list(&self, i: usize) -> Result<Vec<String>> {
        let cell = self.cells[i];
        if cell.is_empty() {
            return Ok(Vec::new());
        }
        cell.split(LIST_DELIMITER)
            .map(|element| {
                if element == EMPTY_ELEMENT {
                    Ok(String::new())
                } else {
                    unescape(element).map_err(|e| self.err(i, format!("bad escape {}", e)))
                }
            })
            .collect()
    }

    fn boolean(&self, i: usize) -> Result<bool> {
        match self.cells[i] {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(self.err(i, format!("expected true/false, found `{}`", other))),
        }
    }
}

fn rows<'a>(data: &'a str) -> impl Iterator<Item = (usize, &'a str)> + 'a {
    data.split_terminator('\n').enumerate().map(|(i, l)| (i + 1, l))
}

/// Parse a node data file written by [`write_nodes`].
pub fn read_nodes(data: &str) -> Result<Vec<Node>> {
    rows(data)
        .map(|(line, text)| {
            let row = Row::split(line, text, NODE_COLUMNS.len())?;
            Ok(Node {
                id: row.string(0)?,
                name: row.optional(1)?,
                full_name: row.optional(2)?,
                category: row.string(3)?,
                category_label: row.string(4)?,
                iri: row.optional(5)?,
                description: row.optional(6)?,
                synonym: row.list(7)?,
                publications: row.list(8)?,
                provided_by: row.optional(9)?,
                update_date: row.optional(10)?,
                deprecated: row.boolean(11)?,
                replaced_by: row.optional(12)?,
            })
        })
        .collect()
}

/// Parse an edge data file written by [`write_edges`].
pub fn read_edges(data: &str) -> Result<Vec<Edge>> {
    rows(data)
        .map(|(line, text)| {
            let row = Row::split(line, text, EDGE_COLUMNS.len())?;
            let info = row.string(7)?;
            let publications_info: BTreeMap<String, serde_json::Value> =
                serde_json::from_str(&info).map_err(|e| row.err(7, e))?;
            Ok(Edge {
                subject: row.string(0)?,
                object: row.string(1)?,
                edge_label: row.string(2)?,
                relation: row.string(3)?,
                relation_curie: row.string(4)?,
                negated: row.boolean(5)?,
                publications: row.list(6)?,
                publications_info,
                provided_by: row.optional(8)?,
                update_date: row.optional(9)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape("a\tb\nc\\dǂe\r"), "a\\tb\\nc\\\\d\\de\\r");
        assert_eq!(unescape("a\\tb\\nc\\\\d\\de\\r").unwrap(), "a\tb\nc\\dǂe\r");
    }

    #[test]
    fn test_unescape_rejects_unknown_sequence() {
        assert!(unescape("oops\\x").is_err());
        assert!(unescape("trailing\\").is_err());
    }

    #[test]
    fn test_node_row_layout() {
        let mut node = Node::new("A1", "https://w3id.org/biolink/vocab/Gene", "gene");
        node.synonym = vec!["BRCA1".into(), "BRCA1-syn".into()];
        let row = write_nodes(&[node]);
        let cells: Vec<&str> = row.trim_end_matches('\n').split('\t').collect();
        assert_eq!(cells.len(), NODE_COLUMNS.len());
        assert_eq!(cells[0], "A1");
        assert_eq!(cells[1], "\\N");
        assert_eq!(cells[7], "BRCA1ǂBRCA1-syn");
        assert_eq!(cells[8], "");
        assert_eq!(cells[11], "false");
    }

    #[test]
    fn test_headers() {
        assert!(nodes_header().starts_with("id\tname\tfull name\t"));
        assert_eq!(edges_header().matches('\t').count(), EDGE_COLUMNS.len() - 1);
    }

    #[test]
    fn test_empty_list_element_distinct_from_empty_list() {
        let mut with_empty = Node::new("A", "c", "c");
        with_empty.synonym = vec![String::new()];
        let without = Node::new("B", "c", "c");
        let back = read_nodes(&write_nodes(&[with_empty.clone(), without.clone()])).unwrap();
        assert_eq!(back, vec![with_empty, without]);
    }

    #[test]
    fn test_edge_publication_info_round_trip() {
        let mut info = BTreeMap::new();
        info.insert("PMID:1".to_string(), json!({"sentence": "tab\there", "score": 0.5}));
        let edge = Edge {
            subject: "A1".into(),
            object: "B1".into(),
            edge_label: "interacts_with".into(),
            relation: "https://w3id.org/biolink/vocab/interacts_with".into(),
            relation_curie: "biolink:interacts_with".into(),
            negated: true,
            publications: vec!["PMID:1".into()],
            publications_info: info,
            provided_by: None,
            update_date: Some("2019-05-01".into()),
        };
        let back = read_edges(&write_edges(&[edge.clone()]).unwrap()).unwrap();
        assert_eq!(back, vec![edge]);
    }

    #[test]
    fn test_wrong_width_reports_line() {
        let err = read_nodes("A1\tonly-two\n").unwrap_err();
        assert!(matches!(err, Error::Tsv { line: 1, .. }));
    }

    fn awkward_string() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just('a'),
                Just('N'),
                Just('e'),
                Just('\\'),
                Just('\t'),
                Just('\n'),
                Just('\r'),
                Just('ǂ'),
                Just('é'),
            ],
            0..6,
        )
        .prop_map(|chars| chars.into_iter().collect())
    }

    fn arb_node() -> impl Strategy<Value = Node> {
        let scalars = (
            awkward_string(),
            prop::option::of(awkward_string()),
            prop::option::of(awkward_string()),
            awkward_string(),
            prop::option::of(awkward_string()),
            prop::option::of(awkward_string()),
        );
        let rest = (
            prop::collection::vec(awkward_string(), 0..4),
            prop::collection::vec(awkward_string(), 0..3),
            prop::option::of(awkward_string()),
            prop::option::of(awkward_string()),
            any::<bool>(),
            prop::option::of(awkward_string()),
        );
        (scalars, rest).prop_map(
            |(
                (id, name, full_name, label, iri, description),
                (synonym, publications, provided_by, update_date, deprecated, replaced_by),
            )| Node {
                id,
                name,
                full_name,
                category: format!("https://w3id.org/biolink/vocab/{}", label),
                category_label: label,
                iri,
                description,
                synonym,
                publications,
                provided_by,
                update_date,
                deprecated,
                replaced_by,
            },
        )
    }

    fn arb_edge() -> impl Strategy<Value = Edge> {
        (
            awkward_string(),
            awkward_string(),
            awkward_string(),
            any::<bool>(),
            prop::collection::vec(awkward_string(), 0..3),
            prop::collection::btree_map(
                awkward_string(),
                (awkward_string(), prop::num::f64::NORMAL),
                0..3,
            ),
            prop::option::of(awkward_string()),
            prop::option::of(awkward_string()),
        )
            .prop_map(|(subject, object, label, negated, publications, info, provided_by, update_date)| Edge {
                subject,
                object,
                relation: format!("https://w3id.org/biolink/vocab/{}", label),
                relation_curie: format!("biolink:{}", label),
                edge_label: label,
                negated,
                publications,
                publications_info: info
                    .into_iter()
                    .map(|(k, (sentence, score))| (k, json!({ "sentence": sentence, "score": score })))
                    .collect(),
                provided_by,
                update_date,
            })
    }

    #[test]
    fn test_publication_scores_read_back_exactly() {
        let publications_info = [0.49948165613679363_f64, 0.1 + 0.2, 1e-300, 2.0_f64.sqrt()]
            .into_iter()
            .enumerate()
            .map(|(i, score)| (format!("PMID:{}", i), json!({ "score": score })))
            .collect();
        let edge = Edge {
            subject: "A1".into(),
            object: "B1".into(),
            edge_label: "interacts_with".into(),
            relation: "https://w3id.org/biolink/vocab/interacts_with".into(),
            relation_curie: "biolink:interacts_with".into(),
            negated: false,
            publications: Vec::new(),
            publications_info,
            provided_by: None,
            update_date: None,
        };
        let back = read_edges(&write_edges(&[edge.clone()]).unwrap()).unwrap();
        assert_eq!(back, vec![edge]);
    }

    proptest! {
        #[test]
        fn nodes_read_back_field_for_field(nodes in prop::collection::vec(arb_node(), 0..5)) {
            let back = read_nodes(&write_nodes(&nodes)).unwrap();
            prop_assert_eq!(back, nodes);
        }

        #[test]
        fn edges_read_back_field_for_field(edges in prop::collection::vec(arb_edge(), 0..5)) {
            let back = read_edges(&write_edges(&edges).unwrap()).unwrap();
            prop_assert_eq!(back, edges);
        }
    }
}
