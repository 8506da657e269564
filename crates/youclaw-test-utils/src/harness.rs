// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the complete assistant stack with mock adapters,
//! a temp SQLite database, and a controllable clock. Provides
//! `send_message()` to drive the router the way a channel would.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use youclaw_agent::{ChannelRegistry, MessageRouter, RouterSettings};
use youclaw_config::model::YouclawConfig;
use youclaw_context::{ContextBuilder, SystemPrompt};
use youclaw_core::{MessageSink, YouclawError};
use youclaw_cron::{SchedulerSettings, TaskScheduler};
use youclaw_memory::store::Clock;
use youclaw_memory::{EmbeddingClient, MemoryStore};
use youclaw_resilience::InferenceDispatcher;
use youclaw_storage::Database;

use crate::mock_channel::MockChannel;
use crate::mock_embedder::{DEFAULT_DIMENSIONS, MockEmbedder};
use crate::mock_provider::MockProvider;

/// Manually advanced wall clock shared by the memory store and scheduler.
#[derive(Clone)]
pub struct TestClock {
    millis: Arc<AtomicI64>,
}

impl TestClock {
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.millis.store(to.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    /// Move the clock backwards, as a wall-clock adjustment would.
    pub fn rewind(&self, by: Duration) {
        self.millis.fetch_sub(by.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn clock(&self) -> Clock {
        let millis = Arc::clone(&self.millis);
        Arc::new(move || {
            DateTime::from_timestamp_millis(millis.load(Ordering::SeqCst)).unwrap_or_default()
        })
    }
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    responder: Option<Box<dyn Fn(&youclaw_core::ProviderRequest) -> String + Send + Sync>>,
    provider_delay: Duration,
    system_prompt: Option<String>,
    start: DateTime<Utc>,
    config: YouclawConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = YouclawConfig::default();
        config.memory.embedding_dimensions = DEFAULT_DIMENSIONS;
        config.memory.embed_timeout_secs = 5;
        config.memory.embed_initial_backoff_ms = 10;
        config.agent.reply_timeout_secs = 10;
        config.scheduler.task_timeout_secs = 10;
        config.scheduler.tick_interval_secs = 1;
        Self {
            responses: Vec::new(),
            responder: None,
            provider_delay: Duration::ZERO,
            system_prompt: None,
            start: Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).single().unwrap_or_default(),
            config,
        }
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Answer with `f(request)` once the scripted responses run out.
    pub fn with_responder<F>(mut self, f: F) -> Self
    where
        F: Fn(&youclaw_core::ProviderRequest) -> String + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(f));
        self
    }

    pub fn with_provider_delay(mut self, delay: Duration) -> Self {
        self.provider_delay = delay;
        self
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Start the test clock at `start`.
    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Adjust the configuration before the stack is assembled.
    pub fn configure(mut self, f: impl FnOnce(&mut YouclawConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, YouclawError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| YouclawError::Storage { source: e.into() })?;
        let mut config = self.config;
        config.storage.database_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .into_owned();
        if let Some(prompt) = self.system_prompt {
            config.agent.system_prompt = Some(prompt);
        }

        let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
        let clock = TestClock::at(self.start);

        let mut provider = MockProvider::with_responses(self.responses).with_delay(self.provider_delay);
        if let Some(responder) = self.responder {
            provider = provider.with_responder(move |req| responder(req));
        }
        let provider = Arc::new(provider);
        let embedder = Arc::new(MockEmbedder::with_dimensions(
            config.memory.embedding_dimensions,
        ));

        let memory = MemoryStore::new(
            db.clone(),
            EmbeddingClient::from_config(embedder.clone(), &config.memory),
            config.memory.similarity_threshold,
        )
        .with_clock(clock.clock());
        let context = ContextBuilder::from_config(memory.clone(), &config.memory);
        let dispatcher = Arc::new(InferenceDispatcher::new(provider.clone()));
        let system_prompt = SystemPrompt::from_config(&config.agent);

        let router = Arc::new(MessageRouter::new(
            Arc::clone(&dispatcher),
            context.clone(),
            system_prompt.clone(),
            RouterSettings::from_config(&config),
        ));

        let channel = MockChannel::new();
        let mut registry = ChannelRegistry::new();
        registry.add_channel(Box::new(channel.clone()));
        registry.connect_all().await?;
        let registry = Arc::new(registry);

        let sink: Arc<dyn MessageSink> = registry.clone();
        let scheduler = Arc::new(
            TaskScheduler::new(
                db.clone(),
                Arc::clone(&dispatcher),
                context.clone(),
                sink,
                system_prompt,
                SchedulerSettings::from_config(&config.scheduler, &config.memory),
            )
            .with_clock(clock.clock()),
        );

        Ok(TestHarness {
            provider,
            embedder,
            channel,
            db,
            memory,
            context,
            dispatcher,
            router,
            registry,
            scheduler,
            clock,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub provider: Arc<MockProvider>,
    pub embedder: Arc<MockEmbedder>,
    /// Registered in `registry` as platform `mock`.
    pub channel: MockChannel,
    pub db: Database,
    pub memory: MemoryStore,
    pub context: ContextBuilder,
    pub dispatcher: Arc<InferenceDispatcher>,
    pub router: Arc<MessageRouter>,
    pub registry: Arc<ChannelRegistry>,
    /// Delivers through `registry`.
    pub scheduler: Arc<TaskScheduler>,
    pub clock: TestClock,
    pub config: YouclawConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings.
    pub async fn new() -> Result<Self, YouclawError> {
        Self::builder().build().await
    }

    /// Route `text` from `user_id` on the mock platform and return the reply.
    pub async fn send_message(&self, user_id: &str, text: &str) -> String {
        self.router.handle("mock", user_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_replies_and_remembers() {
        let harness = TestHarness::builder()
            .with_mock_responses(vec!["Noted!".into()])
            .build()
            .await
            .unwrap();
        let reply = harness.send_message("alice", "I like tea").await;
        assert_eq!(reply, "Noted!");
        assert_eq!(harness.memory.count("alice").await.unwrap(), 2);
    }

    #[test]
    fn clock_moves_both_ways() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = TestClock::at(start);
        let read = clock.clock();
        clock.advance(Duration::from_secs(90));
        assert_eq!(read(), start + chrono::Duration::seconds(90));
        clock.rewind(Duration::from_secs(30));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(60));
    }
}
