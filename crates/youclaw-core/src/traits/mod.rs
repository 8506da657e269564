// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod embedding;
pub mod provider;
pub mod sink;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use embedding::EmbeddingAdapter;
pub use provider::ProviderAdapter;
pub use sink::MessageSink;
