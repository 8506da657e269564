// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the core subsystems from a validated configuration.

use std::sync::Arc;

use tracing::debug;

use youclaw_agent::{MessageRouter, RouterSettings};
use youclaw_config::model::YouclawConfig;
use youclaw_context::{ContextBuilder, SystemPrompt};
use youclaw_core::{MessageSink, YouclawError};
use youclaw_cron::{SchedulerSettings, TaskScheduler};
use youclaw_memory::{EmbeddingClient, MemoryStore};
use youclaw_ollama::{OllamaEmbedder, OllamaProvider};
use youclaw_resilience::InferenceDispatcher;
use youclaw_storage::Database;

/// Shared handles every subcommand builds on.
pub struct Runtime {
    pub config: YouclawConfig,
    pub db: Database,
    pub memory: MemoryStore,
    pub context: ContextBuilder,
    pub dispatcher: Arc<InferenceDispatcher>,
    pub system_prompt: SystemPrompt,
}

impl Runtime {
    /// Open the database and construct the Ollama-backed adapters.
    ///
    /// No network traffic happens here; the adapters connect lazily.
    pub async fn open(config: YouclawConfig) -> Result<Self, YouclawError> {
        let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;

        let embedder = Arc::new(OllamaEmbedder::new(&config.ollama)?);
        let provider = Arc::new(OllamaProvider::new(&config.ollama)?);
        debug!(
            chat_model = provider.model(),
            embedding_model = embedder.model(),
            "ollama adapters ready"
        );

        let memory = MemoryStore::new(
            db.clone(),
            EmbeddingClient::from_config(embedder, &config.memory),
            config.memory.similarity_threshold,
        );
        let context = ContextBuilder::from_config(memory.clone(), &config.memory);
        let dispatcher = Arc::new(InferenceDispatcher::new(provider));
        let system_prompt = SystemPrompt::from_config(&config.agent);

        Ok(Self {
            config,
            db,
            memory,
            context,
            dispatcher,
            system_prompt,
        })
    }

    pub fn router(&self) -> MessageRouter {
        MessageRouter::new(
            Arc::clone(&self.dispatcher),
            self.context.clone(),
            self.system_prompt.clone(),
            RouterSettings::from_config(&self.config),
        )
    }

    /// Scheduler that delivers through `sink`.
    pub fn scheduler(&self, sink: Arc<dyn MessageSink>) -> TaskScheduler {
        TaskScheduler::new(
            self.db.clone(),
            Arc::clone(&self.dispatcher),
            self.context.clone(),
            sink,
            self.system_prompt.clone(),
            SchedulerSettings::from_config(&self.config.scheduler, &self.config.memory),
        )
    }
}
