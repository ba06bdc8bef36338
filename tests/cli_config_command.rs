//! Integration tests for the `drainwatch config` subcommand template

use drainwatch::cli::generate_config_template;
use drainwatch::config::Config;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_generated_template_creates_valid_config_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("drainwatch.toml");

    fs::write(&config_path, generate_config_template()).expect("Failed to write template");

    let config =
        Config::from_file(&config_path).expect("Generated template should load as valid Config");
    assert_eq!(config, Config::default());
}

#[test]
fn test_template_documents_every_setting() {
    let template = generate_config_template();
    for key in [
        "host",
        "port",
        "metrics_path",
        "logs_path",
        "token_param_name",
        "token_param_value",
        "log_level",
    ] {
        assert!(
            template.contains(&format!("{key} = ")),
            "template is missing {key}"
        );
    }
}
