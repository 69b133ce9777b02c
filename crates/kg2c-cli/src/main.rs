//! kg2c: canonicalized knowledge graph builder.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use kg2c_core::{BuildConfig, CanonicalGraph};
use kg2c_emit::{json, write_atomic, GraphEmitter};
use kg2c_ingest::Vocabulary;
use kg2c_resolve::SynonymClusters;
use kg2c_runtime::{AuditRecord, BuildInput, BuildSummary, CanonicalizationEngine};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod source;

use source::{load_clusters, Neo4jSource, RecordSource};

const BUILD_SUMMARY_JSON: &str = "build_summary.json";

#[derive(Parser, Debug)]
#[command(name = "kg2c", about = "Build the canonicalized KG2 graph")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Normalize, merge synonym clusters, and write every KG2c artifact.
    Build {
        /// Path to kg2c_config.json
        #[arg(long)]
        config: PathBuf,
        #[command(flatten)]
        source: SourceArgs,
        /// Synonym cluster assignment (JSON array of identifier arrays)
        #[arg(long)]
        clusters: Option<PathBuf>,
        /// Output directory, replaced as a whole on success
        #[arg(long)]
        output: PathBuf,
        /// Test mode: cap input volume, skip synonymizer and upload
        #[arg(long)]
        test: bool,
    },

    /// Extract and normalize records into a KG2-format JSON graph, without merging.
    Normalize {
        /// Optional config supplying vocabulary overrides and engine settings
        #[arg(long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        source: SourceArgs,
        /// Output JSON file
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        test: bool,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// JSON file with raw `nodes` and `edges` arrays
    #[arg(long, conflicts_with = "neo4j_endpoint", required_unless_present = "neo4j_endpoint")]
    input: Option<PathBuf>,
    /// Neo4j base URL, e.g. http://localhost:7474
    #[arg(long)]
    neo4j_endpoint: Option<String>,
    #[arg(long, env = "KG2C_NEO4J_USER", default_value = "neo4j")]
    neo4j_user: String,
    #[arg(long, env = "KG2C_NEO4J_PASSWORD", default_value = "")]
    neo4j_password: String,
}

impl SourceArgs {
    fn record_source(&self) -> anyhow::Result<RecordSource> {
        match (&self.input, &self.neo4j_endpoint) {
            (Some(path), _) => Ok(RecordSource::File(path.clone())),
            (None, Some(endpoint)) => Ok(RecordSource::Neo4j(Neo4jSource::new(
                endpoint,
                &self.neo4j_user,
                &self.neo4j_password,
            )?)),
            (None, None) => anyhow::bail!("either --input or --neo4j-endpoint is required"),
        }
    }
}

/// Hand-offs to external collaborators requested by the config.
#[derive(Debug, Serialize)]
struct Delegations {
    synonymizer_rebuild: bool,
    upload: bool,
}

/// Contents of `build_summary.json`.
#[derive(Debug, Serialize)]
struct BuildReport<'a> {
    kg2_version: &'a str,
    biolink_version: &'a str,
    test_mode: bool,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    delegations: Delegations,
    summary: &'a BuildSummary,
    audit: &'a AuditRecord,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            source,
            clusters,
            output,
            test,
        } => cmd_build(&config, &source, clusters.as_deref(), &output, test).await,
        Commands::Normalize {
            config,
            source,
            output,
            test,
        } => cmd_normalize(config.as_deref(), &source, &output, test).await,
    }
}

fn load_config(path: &Path, test: bool) -> anyhow::Result<BuildConfig> {
    let mut config =
        BuildConfig::load(path).with_context(|| format!("loading {}", path.display()))?;
    config.test_mode |= test;
    config.validate()?;
    info!(
        "KG2 version {}, Biolink version {}{}",
        config.kg2_version,
        config.biolink_version,
        if config.test_mode { " (test mode)" } else { "" }
    );
    Ok(config)
}

async fn cmd_build(
    config_path: &Path,
    source: &SourceArgs,
    clusters_path: Option<&Path>,
    output: &Path,
    test: bool,
) -> anyhow::Result<()> {
    let started_at = Utc::now();
    let config = load_config(config_path, test)?;
    let vocab = Vocabulary::from_config(&config.vocabulary)?;

    let delegations = Delegations {
        synonymizer_rebuild: config.should_build_synonymizer(),
        upload: config.should_upload(),
    };
    if delegations.synonymizer_rebuild {
        info!("Synonymizer rebuild requested; delegated to the external synonymizer");
    }

    let raw = source
        .record_source()?
        .fetch(config.test_mode)
        .await
        .context("fetching raw records")?;

    let clusters = match clusters_path {
        Some(path) => load_clusters(path).with_context(|| format!("loading {}", path.display()))?,
        None => {
            warn!("No synonym clusters given; every node is its own canonical identity");
            SynonymClusters::default()
        }
    };

    let input = BuildInput {
        nodes: raw.nodes,
        edges: raw.edges,
        clusters,
    };
    let engine = CanonicalizationEngine::new(&vocab, config.effective_engine());
    let build = engine.build(&input).context("canonical build failed")?;

    let mut artifacts = GraphEmitter::new(config.biolink_version.as_str()).render(&build.graph)?;
    let report = BuildReport {
        kg2_version: &config.kg2_version,
        biolink_version: &config.biolink_version,
        test_mode: config.test_mode,
        started_at,
        finished_at: Utc::now(),
        delegations,
        summary: &build.summary,
        audit: &build.audit,
    };
    artifacts.insert_json(BUILD_SUMMARY_JSON, &report)?;
    write_atomic(output, &artifacts).with_context(|| format!("writing {}", output.display()))?;

    if report.delegations.upload {
        info!("Upload of {} requested; delegated to the external uploader", output.display());
    }
    info!(
        "KG2c build finished: {} nodes, {} edges in {}s",
        build.summary.canonical_nodes,
        build.summary.canonical_edges,
        (report.finished_at - started_at).num_seconds()
    );
    Ok(())
}

async fn cmd_normalize(
    config_path: Option<&Path>,
    source: &SourceArgs,
    output: &Path,
    test: bool,
) -> anyhow::Result<()> {
    let (vocab, engine_config, test_mode) = match config_path {
        Some(path) => {
            let config = load_config(path, test)?;
            (
                Vocabulary::from_config(&config.vocabulary)?,
                config.effective_engine(),
                config.test_mode,
            )
        }
        None => {
            let mut engine = kg2c_core::EngineConfig::default();
            if test {
                engine.record_limit = Some(kg2c_core::TEST_MODE_RECORD_LIMIT);
            }
            (Vocabulary::kg1(), engine, test)
        }
    };

    let raw = source
        .record_source()?
        .fetch(test_mode)
        .await
        .context("fetching raw records")?;

    let engine = CanonicalizationEngine::new(&vocab, engine_config);
    let (batch, _) = engine.normalize(&raw.nodes, &raw.edges)?;
    let graph = CanonicalGraph {
        nodes: batch.nodes,
        edges: batch.edges,
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let staged = output.with_extension("json.partial");
    std::fs::write(&staged, json::full_document(&graph)?)?;
    std::fs::rename(&staged, output)?;

    info!(
        "Wrote {} nodes and {} edges to {}",
        graph.nodes.len(),
        graph.edges.len(),
        output.display()
    );
    Ok(())
}
