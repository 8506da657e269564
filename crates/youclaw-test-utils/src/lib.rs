// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for YouClaw integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without an Ollama server.
//!
//! # Components
//!
//! - [`MockProvider`] - scripted LLM provider with delays and failures
//! - [`MockEmbedder`] - deterministic bag-of-words embedder
//! - [`MockChannel`] - messaging channel with message injection and capture
//! - [`MockSink`] - delivery sink that records scheduled deliveries
//! - [`TestHarness`] - the full router + scheduler stack over a temp database

pub mod harness;
pub mod mock_channel;
pub mod mock_embedder;
pub mod mock_provider;
pub mod mock_sink;

pub use harness::{TestClock, TestHarness, TestHarnessBuilder};
pub use mock_channel::MockChannel;
pub use mock_embedder::MockEmbedder;
pub use mock_provider::MockProvider;
pub use mock_sink::MockSink;
