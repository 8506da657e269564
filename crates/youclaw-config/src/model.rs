// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level YouClaw configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct YouclawConfig {
    /// Assistant identity and chat behavior.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Local Ollama inference and embedding service.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Semantic memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Scheduled AI task settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Assistant identity and chat behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// System prompt override. A built-in personality is used when unset.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Prefix that marks a chat message as a command (`/` is always accepted).
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Upper bound on queueing plus inference for one chat reply.
    #[serde(default = "default_reply_timeout_secs")]
    pub reply_timeout_secs: u64,
}

impl AgentConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            command_prefix: default_command_prefix(),
            reply_timeout_secs: default_reply_timeout_secs(),
        }
    }
}

fn default_agent_name() -> String {
    "youclaw".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_reply_timeout_secs() -> u64 {
    60
}

/// Ollama service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Base URL of the Ollama HTTP API.
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model used for chat completions.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for embeddings.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP-level timeout for a single request. Callers apply tighter bounds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_chat_model() -> String {
    "qwen2.5:1.5b-instruct".to_string()
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("youclaw").join("youclaw.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("youclaw.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Semantic memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Fixed vector dimension. Embeddings of any other size are rejected.
    /// 384 matches all-minilm.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Default minimum cosine similarity for `query_similar` (-1.0 to 1.0).
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Number of candidates requested by the context builder.
    #[serde(default = "default_max_context_entries")]
    pub max_context_entries: usize,

    /// Character budget for memory injected into one prompt.
    #[serde(default = "default_context_budget_chars")]
    pub context_budget_chars: usize,

    /// Timeout for a single embedding attempt.
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,

    /// Total embedding attempts before giving up.
    #[serde(default = "default_embed_max_attempts")]
    pub embed_max_attempts: u32,

    /// Backoff before the first retry; doubles on each further retry.
    #[serde(default = "default_embed_initial_backoff_ms")]
    pub embed_initial_backoff_ms: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            embedding_dimensions: default_embedding_dimensions(),
            similarity_threshold: default_similarity_threshold(),
            max_context_entries: default_max_context_entries(),
            context_budget_chars: default_context_budget_chars(),
            embed_timeout_secs: default_embed_timeout_secs(),
            embed_max_attempts: default_embed_max_attempts(),
            embed_initial_backoff_ms: default_embed_initial_backoff_ms(),
        }
    }
}

fn default_embedding_dimensions() -> usize {
    384
}

fn default_similarity_threshold() -> f32 {
    0.35
}

fn default_max_context_entries() -> usize {
    8
}

fn default_context_budget_chars() -> usize {
    4000
}

fn default_embed_timeout_secs() -> u64 {
    15
}

fn default_embed_max_attempts() -> u32 {
    3
}

fn default_embed_initial_backoff_ms() -> u64 {
    200
}

/// Scheduled AI task configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Run the scheduler loop in `serve`.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    /// How often the loop checks for due tasks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Global cap on concurrently firing tasks.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Inference timeout for a single fire, including the wait for the user's lane.
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Interpolate relevant memory into task prompts.
    #[serde(default = "default_include_memory")]
    pub include_memory: bool,
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            tick_interval_secs: default_tick_interval_secs(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            task_timeout_secs: default_task_timeout_secs(),
            include_memory: default_include_memory(),
        }
    }
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_tick_interval_secs() -> u64 {
    5
}

fn default_max_concurrent_tasks() -> usize {
    4
}

fn default_task_timeout_secs() -> u64 {
    120
}

fn default_include_memory() -> bool {
    true
}
