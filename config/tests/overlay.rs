//! Integration tests for file and environment overlays.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use argbind_config::*;
use argbind_core::*;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

fn keys_signature() -> CommandSignature {
    CommandSignature::new("app")
        .with_parameter(SchemaNode::scalar("key1", ScalarKind::Str).with_default("default1"))
        .with_parameter(SchemaNode::scalar("key2", ScalarKind::Str).with_default("default2"))
}

fn bind_with(
    signature: &CommandSignature,
    tokens: &[&str],
    defaults: &SoftDefaults,
) -> BoundResult {
    bind(signature, tokens, &CoercerRegistry::default(), defaults)
}

// ----------------------------------------------------------------------------
// Precedence
// ----------------------------------------------------------------------------

#[test]
fn test_cli_token_beats_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "pyproject.toml",
        "[tool.cyclopts]\nkey1 = \"foo1\"\nkey2 = \"foo2\"\n",
    );
    let config = FileConfig::toml(path).with_root_keys(["tool", "cyclopts"]);
    let signature = keys_signature();
    let defaults = apply_overlays(&[&config as &dyn Overlay], &signature, &[]).unwrap();

    let result = bind_with(&signature, &["--key1=bar"], &defaults);
    assert!(result.is_ok(), "{:?}", result.errors);
    assert_eq!(result.get("key1"), Some(&Value::Str("bar".into())));
    assert_eq!(result.get("key2"), Some(&Value::Str("foo2".into())));
}

#[test]
fn test_first_overlay_owns_the_slot() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "app.yaml", "key1: from-file\nkey2: file-only\n");
    let file = FileConfig::yaml(path);
    let env = Env::new("APP_").with_vars([("APP_KEY1", "from-env")]);
    let signature = keys_signature();

    let defaults = apply_overlays(&[&env as &dyn Overlay, &file], &signature, &[]).unwrap();
    assert_eq!(defaults.get(&["key1".to_string()]).unwrap().source, "env");

    let result = bind_with(&signature, &[], &defaults);
    assert_eq!(result.get("key1"), Some(&Value::Str("from-env".into())));
    assert_eq!(result.get("key2"), Some(&Value::Str("file-only".into())));
}

#[test]
fn test_declared_default_when_no_source_supplies_value() {
    let config = FileConfig::toml("definitely-missing.toml");
    let signature = keys_signature();
    let defaults = apply_overlays(&[&config as &dyn Overlay], &signature, &[]).unwrap();
    assert!(defaults.is_empty());

    let result = bind_with(&signature, &[], &defaults);
    assert_eq!(result.get("key1"), Some(&Value::Str("default1".into())));
}

// ----------------------------------------------------------------------------
// Structured values
// ----------------------------------------------------------------------------

#[test]
fn test_nested_record_mapping_and_sequence_from_toml() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "app.toml",
        concat!(
            "ports = [80, 443]\n\n[user]\nname = \"Ann\"\n\n",
            "[labels]\nteam = \"core\"\ntier = \"gold\"\n",
        ),
    );
    let signature = CommandSignature::new("app")
        .with_parameter(SchemaNode::record(
            "user",
            vec![
                SchemaNode::scalar("name", ScalarKind::Str),
                SchemaNode::scalar("id", ScalarKind::Int),
            ],
        ))
        .with_parameter(
            SchemaNode::mapping("labels", SchemaNode::element(SchemaKind::Scalar(ScalarKind::Str)))
                .keyword_only(),
        )
        .with_parameter(
            SchemaNode::sequence("ports", SchemaNode::element(SchemaKind::Scalar(ScalarKind::Int)))
                .keyword_only(),
        );
    let config = FileConfig::toml(path);
    let defaults = apply_overlays(&[&config as &dyn Overlay], &signature, &[]).unwrap();

    let result = bind_with(&signature, &["--user.id=7"], &defaults);
    assert!(result.is_ok(), "{:?}", result.errors);
    let user = result.get("user").unwrap();
    assert_eq!(user.get("name"), Some(&Value::Str("Ann".into())));
    assert_eq!(user.get("id"), Some(&Value::Int(7)));
    assert_eq!(
        result.get("labels"),
        Some(&Value::Map(vec![
            ("team".into(), Value::Str("core".into())),
            ("tier".into(), Value::Str("gold".into())),
        ]))
    );
    assert_eq!(
        result.get("ports"),
        Some(&Value::List(vec![Value::Int(80), Value::Int(443)]))
    );
}

#[test]
fn test_json_source_with_native_types() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "app.json", r#"{"port": 9000, "debug": true}"#);
    let signature = CommandSignature::new("serve")
        .with_parameter(SchemaNode::scalar("port", ScalarKind::Int).with_default(80i64))
        .with_parameter(SchemaNode::flag("debug"));
    let config = FileConfig::from_path(path).unwrap();
    assert_eq!(config.format(), Format::Json);

    let defaults = apply_overlays(&[&config as &dyn Overlay], &signature, &[]).unwrap();
    let result = bind_with(&signature, &[], &defaults);
    assert_eq!(result.get("port"), Some(&Value::Int(9000)));
    assert_eq!(result.get("debug"), Some(&Value::Bool(true)));
}

#[test]
fn test_invalid_config_value_is_conversion_error() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "app.toml", "port = \"eighty\"\n");
    let signature = CommandSignature::new("serve")
        .with_parameter(SchemaNode::scalar("port", ScalarKind::Int).with_default(80i64));
    let config = FileConfig::toml(path);
    let defaults = apply_overlays(&[&config as &dyn Overlay], &signature, &[]).unwrap();

    let result = bind_with(&signature, &[], &defaults);
    assert!(matches!(
        result.errors.as_slice(),
        [BindError::Conversion { field, .. }] if field == "port"
    ));
}

// ----------------------------------------------------------------------------
// Scoping
// ----------------------------------------------------------------------------

#[test]
fn test_command_path_scopes_lookup() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "app.toml",
        "[tool.app.deploy]\ntarget = \"prod\"\n\n[tool.app.build]\ntarget = \"ignored\"\n",
    );
    let signature = CommandSignature::new("deploy")
        .with_parameter(SchemaNode::scalar("target", ScalarKind::Str));
    let config = FileConfig::toml(path).with_root_keys(["tool", "app"]);
    let defaults =
        apply_overlays(&[&config as &dyn Overlay], &signature, &["deploy".to_string()]).unwrap();

    let result = bind_with(&signature, &[], &defaults);
    assert_eq!(result.get("target"), Some(&Value::Str("prod".into())));
}

#[test]
fn test_missing_scope_contributes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "app.toml", "[other]\nkey1 = \"x\"\n");
    let config = FileConfig::toml(path).with_root_keys(["tool", "app"]);
    let defaults = apply_overlays(&[&config as &dyn Overlay], &keys_signature(), &[]).unwrap();
    assert!(defaults.is_empty());
}

#[test]
fn test_subcommand_tables_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "app.toml",
        "key1 = \"root\"\n\n[rollback]\nsteps = 2\n",
    );
    let mut signature = keys_signature();
    signature.subcommands.push("rollback".into());
    let config = FileConfig::toml(path);

    let defaults = apply_overlays(&[&config as &dyn Overlay], &signature, &[]).unwrap();
    assert_eq!(defaults.len(), 1);
    assert!(defaults.contains(&["key1".to_string()]));
}

#[test]
fn test_unknown_key_is_rejected_unless_allowed() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "app.toml", "[tool.app]\nkey1 = \"a\"\nnope = 1\n");
    let signature = keys_signature();

    let strict = FileConfig::toml(&path).with_root_keys(["tool", "app"]);
    let err = apply_overlays(&[&strict as &dyn Overlay], &signature, &[]).unwrap_err();
    match err {
        ConfigError::UnknownKey { key, .. } => assert_eq!(key, "[tool][app][nope]"),
        other => panic!("unexpected error: {other}"),
    }

    let lenient = FileConfig::toml(&path)
        .with_root_keys(["tool", "app"])
        .allow_unknown(true);
    let defaults = apply_overlays(&[&lenient as &dyn Overlay], &signature, &[]).unwrap();
    assert_eq!(defaults.len(), 1);
}

// ----------------------------------------------------------------------------
// Locating files
// ----------------------------------------------------------------------------

#[test]
fn test_must_exist_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let config = FileConfig::toml(dir.path().join("missing.toml")).must_exist(true);
    assert!(matches!(config.config(), Err(ConfigError::NotFound(_))));

    let optional = FileConfig::toml(dir.path().join("missing.toml"));
    assert!(optional.config().unwrap().is_empty());
}

#[test]
fn test_search_parents_finds_ancestor_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app.toml", "key1 = \"ancestor\"\n");
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let config = FileConfig::toml(nested.join("app.toml"))
        .search_parents(true)
        .must_exist(true);
    let defaults = apply_overlays(&[&config as &dyn Overlay], &keys_signature(), &[]).unwrap();
    assert_eq!(
        defaults.get(&["key1".to_string()]).map(|d| &d.value),
        Some(&serde_json::json!("ancestor"))
    );

    let without_search = FileConfig::toml(nested.join("app.toml")).must_exist(true);
    assert!(matches!(
        without_search.config(),
        Err(ConfigError::NotFound(_))
    ));
}

#[test]
fn test_parse_error_propagates() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "app.toml", "key1 = \n");
    let config = FileConfig::toml(path);
    assert!(matches!(config.config(), Err(ConfigError::Toml(_))));
}

// ----------------------------------------------------------------------------
// Memoization
// ----------------------------------------------------------------------------

#[test]
fn test_loaded_config_is_memoized() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "app.toml", "key1 = \"cached\"\n");
    let config = FileConfig::toml(&path);

    let first = config.config().unwrap();
    fs::remove_file(&path).unwrap();
    let second = config.config().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.get("key1"), Some(&serde_json::json!("cached")));
}

#[test]
fn test_concurrent_loads_share_one_result() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "app.toml", "key1 = \"shared\"\n");
    let config = FileConfig::toml(path);

    let loaded: Vec<Arc<ConfigMap>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| config.config().unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(loaded.iter().all(|c| Arc::ptr_eq(c, &loaded[0])));
}

#[test]
fn test_failed_load_is_not_memoized() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("late.toml");
    let config = FileConfig::toml(&path).must_exist(true);
    assert!(config.config().is_err());

    fs::write(&path, "key1 = \"late\"\n").unwrap();
    assert_eq!(
        config.config().unwrap().get("key1"),
        Some(&serde_json::json!("late"))
    );
}
