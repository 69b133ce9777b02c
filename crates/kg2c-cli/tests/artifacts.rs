//! Artifact shape tests. Run the `kg2c` binary against a small KG1 dump
//! and check the files downstream consumers read.

use std::path::Path;
use std::process::Command;

use serde_json::{json, Value};

fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn fixture(dir: &Path) {
    write_json(
        &dir.join("kg2c_config.json"),
        &json!({
            "kg2_version": "2.7.3",
            "biolink_version": "1.4.0",
            "upload_to_s3": true,
            "build_synonymizer": true,
        }),
    );
    write_json(
        &dir.join("kg1.json"),
        &json!({
            "nodes": [
                {"id": "A1", "category": "gene_ontology:gene", "symbol": "BRCA1", "UUID": "x"},
                {"id": "A2", "category": "gene_ontology:gene", "symbol": "BRCA1-syn"},
                {"id": "B1", "category": "protein", "name": "TP53"},
            ],
            "edges": [
                {"subject": "A2", "object": "B1", "relation": "interacts_with", "is_defined_by": "RTX"},
                {"subject": "A1", "object": "ZZZ", "relation": "interacts_with"},
            ],
        }),
    );
    write_json(&dir.join("clusters.json"), &json!([["A1", "A2"]]));
}

fn run(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_kg2c"))
        .current_dir(dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_build_writes_every_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    fixture(tmp.path());
    let out = run(
        tmp.path(),
        &[
            "build",
            "--config", "kg2c_config.json",
            "--input", "kg1.json",
            "--clusters", "clusters.json",
            "--output", "out",
            "--test",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let dir = tmp.path().join("out");
    for name in [
        "kg2c.json",
        "kg2c_lite.json",
        "nodes_c.tsv",
        "nodes_c_header.tsv",
        "edges_c.tsv",
        "edges_c_header.tsv",
        "kg2c_meta_kg.json",
        "build_summary.json",
        "manifest.json",
    ] {
        assert!(dir.join(name).exists(), "missing {}", name);
    }

    let graph: Value = serde_json::from_slice(&std::fs::read(dir.join("kg2c.json")).unwrap()).unwrap();
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(graph["nodes"][0]["id"], "A1");
    assert_eq!(graph["nodes"][0]["synonym"], json!(["BRCA1", "BRCA1-syn"]));
    assert!(graph["nodes"][0].get("UUID").is_none());
    assert_eq!(graph["edges"][0]["subject"], "A1");
    assert!(graph["edges"][0].get("is_defined_by").is_none());

    let summary: Value =
        serde_json::from_slice(&std::fs::read(dir.join("build_summary.json")).unwrap()).unwrap();
    assert_eq!(summary["kg2_version"], "2.7.3");
    assert_eq!(summary["test_mode"], true);
    // Test mode never hands off to the uploader or synonymizer.
    assert_eq!(summary["delegations"]["upload"], false);
    assert_eq!(summary["delegations"]["synonymizer_rebuild"], false);
    assert_eq!(summary["summary"]["diagnostics"]["orphan_edge"], 1);
    assert_eq!(summary["audit"]["remap"]["A2"], "A1");

    let header = std::fs::read_to_string(dir.join("nodes_c_header.tsv")).unwrap();
    assert!(header.starts_with("id\tname\tfull name\tcategory\t"));
}

#[test]
fn test_failed_build_leaves_no_output() {
    let tmp = tempfile::tempdir().unwrap();
    fixture(tmp.path());
    write_json(
        &tmp.path().join("kg1.json"),
        &json!({"nodes": [{"category": "protein"}], "edges": []}),
    );
    let out = run(
        tmp.path(),
        &[
            "build",
            "--config", "kg2c_config.json",
            "--input", "kg1.json",
            "--output", "out",
        ],
    );
    assert!(!out.status.success());
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn test_normalize_writes_kg2_json() {
    let tmp = tempfile::tempdir().unwrap();
    fixture(tmp.path());
    let out = run(tmp.path(), &["normalize", "--input", "kg1.json", "--output", "kg2.json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let graph: Value = serde_json::from_slice(&std::fs::read(tmp.path().join("kg2.json")).unwrap()).unwrap();
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 3);
    // No clustering: edges keep their source endpoints, orphans included.
    assert_eq!(graph["edges"].as_array().unwrap().len(), 2);
    assert_eq!(graph["edges"][0]["subject"], "A2");
    assert_eq!(graph["edges"][0]["relation curie"], "biolink:interacts_with");
}
