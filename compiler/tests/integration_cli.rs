// Integration tests for the mgc binary.
//
// These tests run the CLI against `tests/fixtures/person.json` and verify:
// - each --emit target produces well-formed output
// - configuration changes artifact naming
// - I/O and load failures exit with code 2

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};

fn mgc_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_mgc"))
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn temp_path(prefix: &str, ext: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "mgc_{}_{}_{}.{}",
        prefix,
        std::process::id(),
        n,
        ext
    ))
}

fn run(args: &[&str]) -> Output {
    Command::new(mgc_binary())
        .args(args)
        .arg(fixture("person.json"))
        .output()
        .expect("failed to run mgc")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "mgc failed.\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn emit_deps_lists_supertype_and_skips_primitives() {
    let json = stdout_json(&run(&["--emit", "deps"]));
    let edges = json["edges"].as_object().unwrap();
    let person = edges["generated.Root_model_Person"].as_array().unwrap();
    assert!(person.iter().any(|v| v == "generated.Root_model_Named"));
    assert!(edges.keys().all(|k| !k.starts_with("generated.Root_String")));

    let files: Vec<&str> = json["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(
        files,
        vec![
            "generated.File_model_greeting$2e$pure",
            "generated.File_model_person$2e$pure"
        ]
    );
}

#[test]
fn emit_partitions_groups_files_with_runtime() {
    let json = stdout_json(&run(&["--emit", "partitions"]));
    let partitions = json["partitions"].as_array().unwrap();
    let runtime = partitions
        .iter()
        .find(|p| p.as_array().unwrap().iter().any(|m| m == "generated.CoreGen"))
        .expect("no partition holds the common runtime");
    let members = runtime.as_array().unwrap();
    assert!(members.iter().any(|m| m == "generated.File_model_greeting$2e$pure"));
    assert!(members.iter().any(|m| m == "generated.File_model_person$2e$pure"));
}

#[test]
fn emit_buckets_writes_manifest() {
    let json = stdout_json(&run(&["--emit", "buckets"]));
    let entries = json.as_array().unwrap();
    let class = entries
        .iter()
        .find(|e| e["classifier_id"] == "meta::pure::metamodel::type::Class")
        .expect("no Class bucket");
    assert!(class["count"].as_u64().unwrap() >= 2);
    for entry in entries {
        assert!(entry["count"].as_u64().unwrap() > 0);
    }
}

#[test]
fn emit_dot_renders_digraph() {
    let output = run(&["--emit", "dot"]);
    assert!(output.status.success());
    let dot = String::from_utf8_lossy(&output.stdout);
    assert!(dot.starts_with("digraph artifacts {"));
    assert!(dot.contains("subgraph cluster_"));
    assert!(dot.contains("label=\"Root_model_Person\""));
}

#[test]
fn build_info_is_reproducible() {
    let first = run(&["--emit", "build-info"]);
    let second = run(&["--emit", "build-info"]);
    assert_eq!(first.stdout, second.stdout);
    let json = stdout_json(&first);
    assert_eq!(json["model_hash"].as_str().unwrap().len(), 64);
    assert_eq!(json["compiler_version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn config_changes_root_package() {
    let config = temp_path("config", "json");
    std::fs::write(&config, r#"{ "root_package": "acme.gen" }"#).unwrap();
    let output = run(&["--emit", "deps", "--config", config.to_str().unwrap()]);
    let json = stdout_json(&output);
    let edges = json["edges"].as_object().unwrap();
    assert!(edges.contains_key("acme.gen.Root_model_Person_Impl"));
    assert!(edges.keys().all(|k| k.starts_with("acme.gen.")));
    let _ = std::fs::remove_file(&config);
}

#[test]
fn output_flag_writes_file() {
    let out = temp_path("deps", "json");
    let output = run(&["--emit", "deps", "-o", out.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("generated.Root_model_Person_Impl"));
    let _ = std::fs::remove_file(&out);
}

#[test]
fn missing_model_exits_with_code_2() {
    let output = Command::new(mgc_binary())
        .arg("/nonexistent/model.json")
        .output()
        .expect("failed to run mgc");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("mgc: error:"));
}

#[test]
fn malformed_config_exits_with_code_2() {
    let config = temp_path("bad_config", "json");
    std::fs::write(&config, "{ not json").unwrap();
    let output = run(&["--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let _ = std::fs::remove_file(&config);
}

#[test]
fn unknown_reference_exits_with_code_2() {
    let model = temp_path("bad_model", "json");
    std::fs::write(
        &model,
        r#"{ "nodes": [ { "id": "a", "classifier": "no::Such" } ] }"#,
    )
    .unwrap();
    let output = Command::new(mgc_binary())
        .arg(&model)
        .output()
        .expect("failed to run mgc");
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no::Such"));
    let _ = std::fs::remove_file(&model);
}
