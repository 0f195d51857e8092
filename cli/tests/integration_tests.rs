use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use serde_json::{Value, json};

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("schema_build_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_schema-build"))
}

/// Descriptor file with one function taking a nested record and one class.
fn write_descriptors(dir: &TempDir) -> PathBuf {
    let json = json!({
        "description": "Deployment tools",
        "commands": [
            {
                "callable": {
                    "kind": "function",
                    "name": "deploy_app",
                    "parameters": [
                        {"name": "target", "type": {"type": "str"}, "required": true},
                        {
                            "name": "limits",
                            "type": {
                                "type": "record",
                                "name": "Limits",
                                "kind": "native_struct",
                                "fields": [
                                    {"name": "cpu", "type": {"type": "float"}, "default": 1.0},
                                    {"name": "memory", "type": {"type": "int"}, "default": 512}
                                ]
                            },
                            "default": null
                        },
                        {"name": "dry_run", "type": {"type": "bool"}, "default": false}
                    ]
                },
                "aliases": ["deploy"]
            },
            {
                "callable": {
                    "kind": "class",
                    "name": "Cluster",
                    "constructor_parameters": [
                        {"name": "context", "type": {"type": "str"}, "default": "local"}
                    ],
                    "methods": [
                        {"name": "scale", "parameters": [
                            {"name": "replicas", "type": {"type": "int"}, "required": true}
                        ]}
                    ]
                }
            }
        ]
    });
    let path = dir.join("callables.json");
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap())
        .expect("failed to write descriptors");
    path
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = bin()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run schema-build");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

// ---------------------------------------------------------------------------
// build / validate
// ---------------------------------------------------------------------------

#[test]
fn build_prints_schema_json() {
    let dir = TempDir::new("build_json");
    let input = write_descriptors(&dir);

    let output = bin()
        .args(["build", "--input", input.to_str().unwrap()])
        .output()
        .expect("failed to run schema-build");
    let schema = stdout_json(&output);

    assert_eq!(schema["description"], json!("Deployment tools"));
    assert_eq!(schema["command_key"], json!("command"));
    let deploy = &schema["commands"][0];
    assert_eq!(deploy["cli_name"], json!("deploy-app"));
    assert_eq!(deploy["aliases"], json!(["deploy"]));

    let names: Vec<&str> = deploy["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|arg| arg["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["target", "limits.cpu", "limits.memory", "dry_run"]);

    let cluster = &schema["commands"][1];
    assert_eq!(cluster["command_type"], json!("class"));
    assert_eq!(cluster["subcommands"][0]["cli_name"], json!("scale"));
}

#[test]
fn build_honours_yaml_config() {
    let dir = TempDir::new("build_config");
    let input = write_descriptors(&dir);
    let config = dir.join("builder.yml");
    fs::write(
        &config,
        "flag_style: keyword_only\nabbreviations: false\npipe:\n  bindings:\n    - command: deploy\n      targets: target\n",
    )
    .unwrap();

    let output = bin()
        .args([
            "build",
            "--input",
            input.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run schema-build");
    let schema = stdout_json(&output);

    let target = &schema["commands"][0]["parameters"][0];
    assert_eq!(target["flags"], json!(["--target"]));
    assert_eq!(target["accepts_stdin"], json!(true));
    assert_eq!(target["pipe_required"], json!(true));
}

#[test]
fn build_yaml_format() {
    let dir = TempDir::new("build_yaml");
    let input = write_descriptors(&dir);

    let output = bin()
        .args(["build", "--input", input.to_str().unwrap(), "--format", "yaml"])
        .output()
        .expect("failed to run schema-build");
    assert!(output.status.success());
    let schema: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["commands"][0]["canonical_name"].as_str(), Some("deploy-app"));
}

#[test]
fn validate_reports_success() {
    let dir = TempDir::new("validate_ok");
    let input = write_descriptors(&dir);

    let output = bin()
        .args(["validate", "--input", input.to_str().unwrap()])
        .output()
        .expect("failed to run schema-build");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 command(s)"), "unexpected output: {stdout}");
}

#[test]
fn build_fails_on_duplicate_alias() {
    let dir = TempDir::new("duplicate_alias");
    let input = dir.join("callables.json");
    let json = json!({
        "commands": [
            {"callable": {"kind": "function", "name": "start", "parameters": []}},
            {"callable": {"kind": "function", "name": "launch", "parameters": []}, "aliases": ["start"]}
        ]
    });
    fs::write(&input, json.to_string()).unwrap();

    let output = bin()
        .args(["build", "--input", input.to_str().unwrap()])
        .output()
        .expect("failed to run schema-build");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("start"), "unexpected stderr: {stderr}");
}

#[test]
fn build_fails_on_malformed_descriptors() {
    let dir = TempDir::new("malformed");
    let input = dir.join("callables.json");
    fs::write(&input, "{\"commands\": [").unwrap();

    let output = bin()
        .args(["build", "--input", input.to_str().unwrap()])
        .output()
        .expect("failed to run schema-build");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("JSON error"), "unexpected stderr: {stderr}");
}

#[test]
fn build_fails_without_commands() {
    let dir = TempDir::new("no_commands");
    let input = dir.join("callables.json");
    fs::write(&input, "{}").unwrap();

    let output = bin()
        .args(["build", "--input", input.to_str().unwrap()])
        .output()
        .expect("failed to run schema-build");
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// pipe
// ---------------------------------------------------------------------------

#[test]
fn pipe_splits_on_delimiter_with_collapse() {
    let output = run_with_stdin(
        &["pipe", "--targets", "src,dst", "--delimiter", ","],
        "a.txt, b.txt, extra",
    );
    let result = stdout_json(&output);
    assert_eq!(result["targets"], json!(["src", "dst"]));
    assert_eq!(result["priority"], json!("cli"));
    assert_eq!(result["chunks"], json!(["a.txt", "b.txt, extra"]));
}

#[test]
fn pipe_single_target_keeps_payload() {
    let output = run_with_stdin(&["pipe", "--targets", "body"], "line one\nline two\n");
    let result = stdout_json(&output);
    assert_eq!(result["chunks"], json!(["line one\nline two\n"]));
}

#[test]
fn pipe_partial_pads_with_null() {
    let output = run_with_stdin(
        &["pipe", "--targets", "a,b,c", "--allow-partial", "--priority", "pipe"],
        "first\nsecond",
    );
    let result = stdout_json(&output);
    assert_eq!(result["priority"], json!("pipe"));
    assert_eq!(result["chunks"], json!(["first", "second", null]));
}

#[test]
fn pipe_count_mismatch_fails() {
    let output = run_with_stdin(&["pipe", "--targets", "a,b"], "only");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stdin"), "unexpected stderr: {stderr}");
}

#[test]
fn pipe_rejects_unknown_priority() {
    let output = run_with_stdin(&["pipe", "--targets", "a", "--priority", "stdin"], "x");
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// reconstruct
// ---------------------------------------------------------------------------

#[test]
fn reconstruct_rebuilds_record_from_leaves() {
    let dir = TempDir::new("reconstruct");
    let input = write_descriptors(&dir);
    let args = dir.join("flat.json");
    fs::write(&args, r#"{"target": "prod", "limits.memory": 2048}"#).unwrap();

    let output = bin()
        .args([
            "reconstruct",
            "--input",
            input.to_str().unwrap(),
            "--command",
            "deploy",
            "--args",
            args.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run schema-build");
    let result = stdout_json(&output);
    assert_eq!(
        result,
        json!({"target": "prod", "limits": {"cpu": 1.0, "memory": 2048}})
    );
}

#[test]
fn reconstruct_untouched_optional_record_is_null() {
    let dir = TempDir::new("reconstruct_null");
    let input = write_descriptors(&dir);
    let args = dir.join("flat.json");
    fs::write(&args, r#"{"target": "prod", "limits.cpu": null, "limits.memory": null}"#).unwrap();

    let output = bin()
        .args([
            "reconstruct",
            "--input",
            input.to_str().unwrap(),
            "--command",
            "deploy-app",
            "--args",
            args.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run schema-build");
    let result = stdout_json(&output);
    assert_eq!(result, json!({"target": "prod", "limits": null}));
}

#[test]
fn reconstruct_unknown_subcommand_fails() {
    let dir = TempDir::new("reconstruct_unknown");
    let input = write_descriptors(&dir);
    let args = dir.join("flat.json");
    fs::write(&args, "{}").unwrap();

    let output = bin()
        .args([
            "reconstruct",
            "--input",
            input.to_str().unwrap(),
            "--command",
            "cluster",
            "--subcommand",
            "drain",
            "--args",
            args.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run schema-build");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("drain"), "unexpected stderr: {stderr}");
}
