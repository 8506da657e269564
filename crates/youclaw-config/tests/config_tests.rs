// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the YouClaw configuration system.

use std::io::Write;

use serial_test::serial;
use youclaw_config::diagnostic::ConfigError;
use youclaw_config::model::YouclawConfig;
use youclaw_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[agent]
name = "claw"
log_level = "debug"
command_prefix = "?"

[ollama]
host = "http://gpu-box:11434"
chat_model = "llama3.2"
embedding_model = "nomic-embed-text"
temperature = 0.2

[storage]
database_path = "/tmp/youclaw-test.db"
wal_mode = false

[memory]
embedding_dimensions = 768
similarity_threshold = 0.5
context_budget_chars = 1200

[scheduler]
tick_interval_secs = 1
max_concurrent_tasks = 2
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "claw");
    assert_eq!(config.agent.command_prefix, "?");
    assert_eq!(config.ollama.host, "http://gpu-box:11434");
    assert_eq!(config.ollama.chat_model, "llama3.2");
    assert_eq!(config.storage.database_path, "/tmp/youclaw-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.memory.embedding_dimensions, 768);
    assert_eq!(config.memory.context_budget_chars, 1200);
    assert_eq!(config.scheduler.max_concurrent_tasks, 2);
    // Untouched keys keep their defaults.
    assert_eq!(config.memory.embed_max_attempts, 3);
    assert_eq!(config.scheduler.task_timeout_secs, 120);
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    let defaults = YouclawConfig::default();
    assert_eq!(config.ollama.host, defaults.ollama.host);
    assert_eq!(config.ollama.embedding_model, "all-minilm");
    assert_eq!(config.memory.embedding_dimensions, 384);
    assert!((config.memory.similarity_threshold - 0.35).abs() < f32::EPSILON);
    assert_eq!(config.agent.reply_timeout_secs, 60);
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[ollama]
chat_modle = "x"
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("chat_model"));
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[dashboard]
port = 8080
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[memory]
embedding_dimensions = "lots"
"#;
    let errors = load_and_validate_str(toml).expect_err("type mismatch must be rejected");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("embedding_dimensions"))),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[scheduler]
tick_interval_secs = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero tick must fail validation");
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("tick_interval_secs")));
}

#[test]
#[serial]
fn env_var_overrides_file_value() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[ollama]\nchat_model = \"from-file\"").unwrap();

    // SAFETY: env mutation is confined to tests marked #[serial].
    unsafe { std::env::set_var("YOUCLAW_OLLAMA_CHAT_MODEL", "from-env") };
    let result = load_and_validate_path(file.path());
    unsafe { std::env::remove_var("YOUCLAW_OLLAMA_CHAT_MODEL") };

    let config = result.expect("config should load");
    assert_eq!(config.ollama.chat_model, "from-env");
}

#[test]
#[serial]
fn env_var_with_underscored_key_maps_to_section() {
    let file = tempfile::NamedTempFile::new().unwrap();

    // SAFETY: env mutation is confined to tests marked #[serial].
    unsafe { std::env::set_var("YOUCLAW_MEMORY_CONTEXT_BUDGET_CHARS", "777") };
    let result = load_and_validate_path(file.path());
    unsafe { std::env::remove_var("YOUCLAW_MEMORY_CONTEXT_BUDGET_CHARS") };

    let config = result.expect("config should load");
    assert_eq!(config.memory.context_budget_chars, 777);
}
