use std::io::Write;

use dataflow_rt::Context;
use indexmap::IndexMap;

#[test]
fn getenv_prefers_config_over_env_over_default() {
    std::env::set_var("DATAFLOW_RT_RETRY_LIMIT", "7");

    let mut config = IndexMap::new();
    config.insert(
        "retry_limit".to_string(),
        serde_yaml::Value::Number(3.into()),
    );
    let with_config = Context::with_config(config);

    assert_eq!(
        with_config.getenv("retry_limit", Some("1")),
        Some("3".to_string())
    );

    let without_config = Context::new();
    assert_eq!(
        without_config.getenv("retry_limit", Some("1")),
        Some("7".to_string())
    );

    std::env::remove_var("DATAFLOW_RT_RETRY_LIMIT");
    assert_eq!(
        without_config.getenv("retry_limit", Some("1")),
        Some("1".to_string())
    );
    assert_eq!(without_config.getenv("retry_limit", None), None);
}

#[test]
fn from_yaml_file_flattens_nested_keys_with_underscores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        "source:\n  batch_size: 64\nsink:\n  path: /var/log/out\nname: demo\n"
    )
    .unwrap();
    drop(file);

    let config_name = path.with_extension("");
    let context = Context::from_yaml_file(config_name.to_str().unwrap()).unwrap();

    assert_eq!(
        context.getenv("source_batch_size", None),
        Some("64".to_string())
    );
    assert_eq!(
        context.getenv("sink_path", None),
        Some("/var/log/out".to_string())
    );
    assert_eq!(context.getenv("name", None), Some("demo".to_string()));
}

#[test]
fn from_yaml_file_missing_returns_empty_context() {
    let context = Context::from_yaml_file("/no/such/path/pipeline-does-not-exist").unwrap();
    assert_eq!(context.getenv("anything", None), None);
}

#[test]
fn merged_with_overlays_other_on_top_of_self() {
    let mut base_config = IndexMap::new();
    base_config.insert(
        "a".to_string(),
        serde_yaml::Value::String("base".to_string()),
    );
    base_config.insert(
        "b".to_string(),
        serde_yaml::Value::String("base".to_string()),
    );
    let base = Context::with_config(base_config);

    let mut overlay_config = IndexMap::new();
    overlay_config.insert(
        "b".to_string(),
        serde_yaml::Value::String("overlay".to_string()),
    );
    let overlay = Context::with_config(overlay_config);

    let merged = base.merged_with(&overlay);
    assert_eq!(merged.getenv("a", None), Some("base".to_string()));
    assert_eq!(merged.getenv("b", None), Some("overlay".to_string()));
}
