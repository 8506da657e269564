// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by adapters, the memory store, and the scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Embedding,
}

/// Where a memory entry came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    /// A live chat exchange.
    Conversation,
    /// Output of a scheduled AI task.
    ScheduledTask,
    /// Added by hand through the CLI or a command.
    Manual,
}

impl MemorySource {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemorySource::Conversation => "conversation",
            MemorySource::ScheduledTask => "scheduled_task",
            MemorySource::Manual => "manual",
        }
    }

    /// Parse from SQLite string.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "conversation" => MemorySource::Conversation,
            "scheduled_task" => MemorySource::ScheduledTask,
            _ => MemorySource::Manual,
        }
    }
}

/// Speaker of a conversational memory entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse from SQLite string. Unknown values yield `None`.
    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// Where a scheduled task's output is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryTarget {
    /// Platform name, matching a registered channel adapter (e.g. `telegram`, `console`).
    pub platform: String,
    /// Platform-specific channel or user reference.
    pub channel: String,
}

impl std::fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.platform, self.channel)
    }
}

// --- Channel types ---

/// An inbound chat message delivered by a platform adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Adapter-assigned message identifier.
    pub id: String,
    /// Platform that produced the message.
    pub platform: String,
    /// Platform-scoped user identifier.
    pub user_id: String,
    /// Conversation/channel reference used to route the reply.
    pub channel: String,
    /// Raw message text.
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub channel: String,
    pub text: String,
    /// Inbound message id this replies to, if any.
    pub reply_to: Option<String>,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone, Default)]
pub struct ChannelCapabilities {
    pub supports_markdown: bool,
    pub max_message_length: Option<usize>,
}

// --- Provider types ---

/// A single completion request to the language model.
#[derive(Debug, Clone, Default)]
pub struct ProviderRequest {
    /// Model override; the provider's configured model is used when `None`.
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ProviderRequest {
    /// A request with only a user prompt; everything else uses provider defaults.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Whether an installed model name satisfies a requested one.
///
/// A name without a tag matches its `:latest` install, so `qwen2.5`
/// matches `qwen2.5:latest`.
pub fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || (!wanted.contains(':') && installed.strip_suffix(":latest") == Some(wanted))
}

/// A completed generation.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub model: String,
}

// --- Embedding types ---

/// Input texts to embed.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Embeddings in the same order as the input texts.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}
