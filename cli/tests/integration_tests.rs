use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value as Json, json};
use tempfile::TempDir;

/// Signature with a required record and an aliased keyword-only flag.
fn write_signature(dir: &Path) -> PathBuf {
    let signature = json!({
        "command": "add",
        "parameters": [
            {
                "name": "user",
                "kind": {"record": [
                    {"name": "name", "kind": {"scalar": "str"}},
                    {"name": "id", "kind": {"scalar": "int"}}
                ]}
            },
            {
                "name": "verbose",
                "kind": {"scalar": "bool"},
                "required": false,
                "default": false,
                "binding": "keyword_only",
                "aliases": ["-v"]
            }
        ]
    });
    let path = dir.join("add.json");
    fs::write(&path, serde_json::to_string_pretty(&signature).unwrap())
        .expect("failed to write signature");
    path
}

fn argbind() -> Command {
    Command::new(env!("CARGO_BIN_EXE_argbind"))
}

fn stdout_json(output: &Output) -> Json {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

// ---------------------------------------------------------------------------
// bind
// ---------------------------------------------------------------------------

#[test]
fn bind_prints_bound_arguments() {
    let dir = TempDir::new().unwrap();
    let signature = write_signature(dir.path());

    let output = argbind()
        .args(["bind", "--signature", signature.to_str().unwrap(), "--"])
        .args(["--user.name=Alice", "--user.id", "7", "-v", "extra"])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let result = stdout_json(&output);
    assert_eq!(result["arguments"]["user"], json!({"name": "Alice", "id": 7}));
    assert_eq!(result["arguments"]["verbose"], json!(true));
    assert_eq!(result["errors"], json!([]));
    assert_eq!(result["unused"], json!(["extra"]));
}

#[test]
fn bind_exits_nonzero_on_binding_errors() {
    let dir = TempDir::new().unwrap();
    let signature = write_signature(dir.path());

    let output = argbind()
        .args(["bind", "--signature", signature.to_str().unwrap(), "--"])
        .args(["--user.name=Alice", "--user.id=seven"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["errors"][0]["error"], json!("conversion"));
    assert_eq!(result["errors"][0]["field"], json!("user.id"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: invalid value"), "stderr: {stderr}");
}

#[test]
fn bind_reports_missing_required_field() {
    let dir = TempDir::new().unwrap();
    let signature = write_signature(dir.path());

    let output = argbind()
        .args(["bind", "--signature", signature.to_str().unwrap(), "--"])
        .args(["--user.name=Alice"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["errors"][0]["error"], json!("missing_argument"));
    assert_eq!(result["errors"][0]["field"], json!("user.id"));
}

#[test]
fn bind_fills_slots_from_config_and_environment() {
    let dir = TempDir::new().unwrap();
    let signature = write_signature(dir.path());
    let config = dir.path().join("pyproject.toml");
    fs::write(
        &config,
        "[tool.app.user]\nname = \"FromConfig\"\nid = 1\n",
    )
    .unwrap();

    let output = argbind()
        .args(["bind", "--signature", signature.to_str().unwrap()])
        .args(["--config", config.to_str().unwrap()])
        .args(["--root-key", "tool", "--root-key", "app"])
        .args(["--env-prefix", "ARGBIND_TEST_"])
        .env("ARGBIND_TEST_USER_ID", "42")
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let result = stdout_json(&output);
    assert_eq!(result["arguments"]["user"], json!({"name": "FromConfig", "id": 42}));
}

#[test]
fn bind_rejects_unknown_config_keys() {
    let dir = TempDir::new().unwrap();
    let signature = write_signature(dir.path());
    let config = dir.path().join("app.yaml");
    fs::write(&config, "user:\n  name: Ann\n  id: 3\ncolour: blue\n").unwrap();

    let strict = argbind()
        .args(["bind", "--signature", signature.to_str().unwrap()])
        .args(["--config", config.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(strict.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&strict.stderr);
    assert!(stderr.contains("unknown configuration key [colour]"), "stderr: {stderr}");

    let lenient = argbind()
        .args(["bind", "--signature", signature.to_str().unwrap()])
        .args(["--config", config.to_str().unwrap(), "--allow-unknown"])
        .output()
        .unwrap();
    assert!(lenient.status.success());
    assert_eq!(
        stdout_json(&lenient)["arguments"]["user"],
        json!({"name": "Ann", "id": 3})
    );
}

#[test]
fn bind_renders_yaml() {
    let dir = TempDir::new().unwrap();
    let signature = write_signature(dir.path());

    let output = argbind()
        .args(["bind", "--signature", signature.to_str().unwrap(), "--format", "yaml", "--"])
        .args(["Alice", "7"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: Alice"), "stdout: {stdout}");
    assert!(stdout.contains("id: 7"), "stdout: {stdout}");
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_json_and_yaml_signatures() {
    let dir = TempDir::new().unwrap();
    let json_signature = write_signature(dir.path());
    let yaml_signature = dir.path().join("serve.yaml");
    fs::write(
        &yaml_signature,
        concat!(
            "command: serve\nparameters:\n",
            "  - name: port\n    kind:\n      scalar: int\n    default: 80\n",
        ),
    )
    .unwrap();

    let output = argbind()
        .args(["validate", json_signature.to_str().unwrap(), yaml_signature.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Validated 2 signature file(s) with 3 parameter(s)."));
}

#[test]
fn validate_rejects_duplicate_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dup.json");
    let signature = json!({
        "command": "deploy",
        "parameters": [
            {"name": "dry_run", "kind": {"scalar": "bool"}},
            {"name": "dry-run", "kind": {"scalar": "bool"}}
        ]
    });
    fs::write(&path, signature.to_string()).unwrap();

    let output = argbind().args(["validate", path.to_str().unwrap()]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("duplicate name"), "stderr: {stderr}");
}

#[test]
fn validate_requires_registered_custom_kinds() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("send.json");
    let signature = json!({
        "command": "send",
        "parameters": [{"name": "to", "kind": {"scalar": {"custom": "email"}}}]
    });
    fs::write(&path, signature.to_string()).unwrap();

    let without = argbind().args(["validate", path.to_str().unwrap()]).output().unwrap();
    assert_eq!(without.status.code(), Some(1));

    let with = argbind()
        .args(["validate", path.to_str().unwrap(), "--string-kind", "email"])
        .output()
        .unwrap();
    assert!(with.status.success(), "stderr: {}", String::from_utf8_lossy(&with.stderr));
}

#[test]
fn validate_reports_unreadable_file() {
    let dir = TempDir::new().unwrap();
    let output = argbind()
        .args(["validate", dir.path().join("missing.json").to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}

// ---------------------------------------------------------------------------
// describe
// ---------------------------------------------------------------------------

#[test]
fn describe_lists_flattened_parameters() {
    let dir = TempDir::new().unwrap();
    let signature = write_signature(dir.path());

    let output = argbind()
        .args(["describe", "--signature", signature.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success());
    let info = stdout_json(&output);
    let paths: Vec<&str> = info
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["user.name", "user.id", "verbose"]);
    assert_eq!(info[2]["cli_names"], json!(["--verbose", "--no-verbose", "-v"]));
}
