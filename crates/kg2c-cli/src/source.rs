//! Raw record sources: JSON dump files and the Neo4j HTTP endpoint.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kg2c_core::{Error, RawRecord, Result, TEST_MODE_RECORD_LIMIT};
use kg2c_ingest::edge_record_from_row;
use kg2c_resolve::SynonymClusters;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

const NEO4J_TIMEOUT: Duration = Duration::from_secs(120);
const NODE_QUERY: &str = "MATCH (n) RETURN n";
const EDGE_QUERY: &str = "MATCH (n)-[r]->(m) RETURN n.id, r, m.id";

/// Both raw record streams, in source order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawRecord>,
    #[serde(default)]
    pub edges: Vec<RawRecord>,
}

/// Where raw records come from.
pub enum RecordSource {
    /// A `{"nodes": [...], "edges": [...]}` JSON document.
    File(PathBuf),
    Neo4j(Neo4jSource),
}

impl RecordSource {
    pub async fn fetch(&self, test_mode: bool) -> Result<RawGraph> {
        match self {
            Self::File(path) => read_json(path),
            Self::Neo4j(source) => source.fetch(test_mode).await,
        }
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Load a synonym cluster assignment (`[["A1", "A2"], ...]`).
pub fn load_clusters(path: &Path) -> Result<SynonymClusters> {
    let clusters: SynonymClusters = read_json(path)?;
    info!("Loaded {} synonym clusters from {}", clusters.len(), path.display());
    Ok(clusters)
}

/// Cypher over the legacy Neo4j REST endpoint. No retries.
pub struct Neo4jSource {
    client: Client,
    endpoint: String,
    user: String,
    password: String,
}

/// Response body of `POST /db/data/cypher`.
#[derive(Debug, Deserialize)]
struct CypherResponse {
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

impl Neo4jSource {
    pub fn new(endpoint: &str, user: &str, password: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(NEO4J_TIMEOUT)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    pub async fn fetch(&self, test_mode: bool) -> Result<RawGraph> {
        let nodes = self
            .query(&limited(NODE_QUERY, test_mode))
            .await?
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .filter_map(properties)
            .collect::<Vec<_>>();

        let mut edges = Vec::new();
        for row in self.query(&limited(EDGE_QUERY, test_mode)).await? {
            let mut cells = row.into_iter();
            let (Some(subject), Some(rel), Some(object)) = (cells.next(), cells.next(), cells.next()) else {
                return Err(Error::Transport("edge row with fewer than three columns".into()));
            };
            let payload = properties(rel).unwrap_or_default();
            edges.push(edge_record_from_row(subject, object, payload));
        }

        info!("Fetched {} nodes and {} edges from {}", nodes.len(), edges.len(), self.endpoint);
        Ok(RawGraph { nodes, edges })
    }

    async fn query(&self, statement: &str) -> Result<Vec<Vec<Value>>> {
        let url = format!("{}/db/data/cypher", self.endpoint);
        debug!("POST {}: {}", url, statement);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&json!({ "query": statement, "params": {} }))
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!("{} returned {}: {}", url, status, body)));
        }
        let body: CypherResponse = response
            .json()
            .await
            .map_err(|e| Error::Transport(format!("unreadable cypher response: {}", e)))?;
        Ok(body.data)
    }
}

fn limited(statement: &str, test_mode: bool) -> String {
    if test_mode {
        format!("{} limit {}", statement, TEST_MODE_RECORD_LIMIT)
    } else {
        statement.to_string()
    }
}

/// Property map of a node or relationship cell. The REST format wraps
/// properties in `data`; bare maps are accepted as-is.
fn properties(cell: Value) -> Option<RawRecord> {
    match cell {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Object(data)) => Some(data),
            _ => Some(map),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_mode_limits_queries() {
        assert_eq!(limited(NODE_QUERY, true), "MATCH (n) RETURN n limit 10000");
        assert_eq!(limited(EDGE_QUERY, false), EDGE_QUERY);
    }

    #[test]
    fn test_properties_unwraps_rest_format() {
        let cell = json!({"data": {"id": "A1"}, "metadata": {"id": 7}});
        assert_eq!(properties(cell).unwrap()["id"], "A1");
        let bare = json!({"id": "A1"});
        assert_eq!(properties(bare).unwrap()["id"], "A1");
        assert!(properties(json!("A1")).is_none());
    }

    #[test]
    fn test_file_source_and_clusters() {
        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("kg1.json");
        std::fs::write(
            &graph_path,
            r#"{"nodes": [{"id": "A1", "category": "protein"}], "edges": []}"#,
        )
        .unwrap();
        let clusters_path = dir.path().join("clusters.json");
        std::fs::write(&clusters_path, r#"[["A1", "A2"]]"#).unwrap();

        let graph: RawGraph = read_json(&graph_path).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());
        assert_eq!(load_clusters(&clusters_path).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_json::<RawGraph>(Path::new("/nonexistent/kg1.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
