//! Artifact rendering, manifest, and staged output directory writes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use kg2c_core::{CanonicalGraph, Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::json;
use crate::meta::MetaKnowledgeGraph;
use crate::tsv;

pub const KG2C_JSON: &str = "kg2c.json";
pub const KG2C_LITE_JSON: &str = "kg2c_lite.json";
pub const NODES_TSV: &str = "nodes_c.tsv";
pub const NODES_HEADER_TSV: &str = "nodes_c_header.tsv";
pub const EDGES_TSV: &str = "edges_c.tsv";
pub const EDGES_HEADER_TSV: &str = "edges_c_header.tsv";
pub const META_KG_JSON: &str = "kg2c_meta_kg.json";
pub const MANIFEST_JSON: &str = "manifest.json";

/// Rendered files, keyed by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    files: BTreeMap<String, Vec<u8>>,
}

impl Artifacts {
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }

    /// Add a pretty-printed JSON file.
    pub fn insert_json<T: Serialize>(&mut self, name: impl Into<String>, value: &T) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        self.insert(name, bytes);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub sha256: String,
    pub bytes: usize,
}

/// SHA-256 digests of the graph artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn of(artifacts: &Artifacts) -> Self {
        let files = artifacts
            .iter()
            .map(|(name, bytes)| {
                let entry = ManifestEntry {
                    sha256: sha256_hex(bytes),
                    bytes: bytes.len(),
                };
                (name.to_string(), entry)
            })
            .collect();
        Self { files }
    }

    /// Re-hash every listed file under `dir`.
    pub fn verify(&self, dir: &Path) -> Result<()> {
        for (name, entry) in &self.files {
            let bytes = fs::read(dir.join(name))?;
            if sha256_hex(&bytes) != entry.sha256 {
                return Err(Error::InvariantViolation(format!(
                    "{} does not match its manifest digest",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Serializes a canonical graph into every downstream format.
///
/// Rendering is pure: the same graph always yields byte-identical artifacts.
pub struct GraphEmitter {
    biolink_version: String,
}

impl GraphEmitter {
    pub fn new(biolink_version: impl Into<String>) -> Self {
        Self {
            biolink_version: biolink_version.into(),
        }
    }

    /// Render the graph artifacts plus `manifest.json` covering them.
    pub fn render(&self, graph: &CanonicalGraph) -> Result<Artifacts> {
        let mut artifacts = Artifacts::default();
        artifacts.insert(KG2C_JSON, json::full_document(graph)?);
        artifacts.insert(KG2C_LITE_JSON, json::lite_document(graph)?);
        artifacts.insert(NODES_HEADER_TSV, tsv::nodes_header().into_bytes());
        artifacts.insert(NODES_TSV, tsv::write_nodes(&graph.nodes).into_bytes());
        artifacts.insert(EDGES_HEADER_TSV, tsv::edges_header().into_bytes());
        artifacts.insert(EDGES_TSV, tsv::write_edges(&graph.edges)?.into_bytes());
        artifacts.insert_json(
            META_KG_JSON,
            &MetaKnowledgeGraph::summarize(graph, &self.biolink_version),
        )?;

        let manifest = Manifest::of(&artifacts);
        artifacts.insert_json(MANIFEST_JSON, &manifest)?;

        info!(
            "Rendered {} artifacts for {} nodes / {} edges",
            artifacts.len(),
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(artifacts)
    }
}

/// Write `artifacts` into `dir` all at once.
///
/// Files are written to a sibling staging directory first, which then
/// replaces `dir`. On failure `dir` is left as it was.
pub fn write_atomic(dir: &Path, artifacts: &Artifacts) -> Result<()> {
    let name = dir
        .file_name()
        .ok_or_else(|| Error::Config(format!("output path {} has no directory name", dir.display())))?
        .to_string_lossy()
        .into_owned();
    let parent = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let pid = std::process::id();
    let staging = parent.join(format!(".{}.staging-{}", name, pid));
    let previous = parent.join(format!(".{}.previous-{}", name, pid));

    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir(&staging)?;
    if let Err(e) = write_files(&staging, artifacts) {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    let had_previous = dir.exists();
    if had_previous {
        fs::rename(dir, &previous)?;
    }
    if let Err(e) = fs::rename(&staging, dir) {
        warn!("Failed to move staged output into {}: {}", dir.display(), e);
        if had_previous {
            let _ = fs::rename(&previous, dir);
        }
        let _ = fs::remove_dir_all(&staging);
        return Err(e.into());
    }
    if had_previous {
        fs::remove_dir_all(&previous)?;
    }

    info!("Wrote {} files to {}", artifacts.len(), dir.display());
    Ok(())
}

fn write_files(staging: &Path, artifacts: &Artifacts) -> Result<()> {
    for (name, bytes) in artifacts.iter() {
        fs::write(staging.join(name), bytes)?;
        debug!("Staged {} ({} bytes)", name, bytes.len());
    }
    Ok(())
}
