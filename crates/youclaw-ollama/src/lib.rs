// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama adapters for the YouClaw assistant runtime.
//!
//! [`OllamaProvider`] implements chat completion over `/api/chat` with
//! streaming disabled. [`OllamaEmbedder`] produces embeddings via `/api/embed`,
//! falling back to the legacy `/api/embeddings` on older servers.

pub mod client;
pub mod embedder;
pub mod provider;
pub mod types;

pub use client::OllamaClient;
pub use embedder::OllamaEmbedder;
pub use provider::OllamaProvider;
