// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::YouclawConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of failing on the first.
pub fn validate_config(config: &YouclawConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let host = config.ollama.host.trim();
    if !(host.starts_with("http://") || host.starts_with("https://")) {
        fail(format!("ollama.host `{host}` must start with http:// or https://"));
    }
    if config.ollama.chat_model.trim().is_empty() {
        fail("ollama.chat_model must not be empty".to_string());
    }
    if config.ollama.embedding_model.trim().is_empty() {
        fail("ollama.embedding_model must not be empty".to_string());
    }
    if !(0.0..=2.0).contains(&config.ollama.temperature) {
        fail(format!(
            "ollama.temperature must be between 0.0 and 2.0, got {}",
            config.ollama.temperature
        ));
    }

    let memory = &config.memory;
    if memory.embedding_dimensions == 0 {
        fail("memory.embedding_dimensions must be greater than 0".to_string());
    }
    if !(-1.0..=1.0).contains(&memory.similarity_threshold) {
        fail(format!(
            "memory.similarity_threshold must be between -1.0 and 1.0, got {}",
            memory.similarity_threshold
        ));
    }
    if memory.max_context_entries == 0 {
        fail("memory.max_context_entries must be at least 1".to_string());
    }
    if memory.context_budget_chars == 0 {
        fail("memory.context_budget_chars must be greater than 0".to_string());
    }
    if memory.embed_max_attempts == 0 {
        fail("memory.embed_max_attempts must be at least 1".to_string());
    }
    if memory.embed_timeout_secs == 0 {
        fail("memory.embed_timeout_secs must be greater than 0".to_string());
    }

    let scheduler = &config.scheduler;
    if scheduler.tick_interval_secs == 0 {
        fail("scheduler.tick_interval_secs must be greater than 0".to_string());
    }
    if scheduler.max_concurrent_tasks == 0 {
        fail("scheduler.max_concurrent_tasks must be at least 1".to_string());
    }
    if scheduler.task_timeout_secs == 0 {
        fail("scheduler.task_timeout_secs must be greater than 0".to_string());
    }

    if config.agent.reply_timeout_secs == 0 {
        fail("agent.reply_timeout_secs must be greater than 0".to_string());
    }
    if config.agent.command_prefix.trim().is_empty() {
        fail("agent.command_prefix must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&YouclawConfig::default()).is_ok());
    }

    #[test]
    fn zero_dimensions_rejected() {
        let mut config = YouclawConfig::default();
        config.memory.embedding_dimensions = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("embedding_dimensions")));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = YouclawConfig::default();
        config.memory.similarity_threshold = 1.5;
        config.scheduler.max_concurrent_tasks = 0;
        config.ollama.host = "localhost:11434".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "got: {:?}", messages(&errors));
    }
}
