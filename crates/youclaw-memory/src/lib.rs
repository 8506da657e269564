// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic memory for the YouClaw assistant runtime.
//!
//! - **EmbeddingClient**: wraps an [`EmbeddingAdapter`](youclaw_core::EmbeddingAdapter)
//!   with per-attempt timeouts, bounded retries, dimension checks and L2 normalization
//! - **MemoryStore**: append-only per-user entries in SQLite, answered by a
//!   linear cosine scan over the user's live vectors
//! - **Types**: MemoryEntry, ScoredEntry, NewMemory and vector helpers

pub mod embedder;
pub mod store;
pub mod types;

pub use embedder::EmbeddingClient;
pub use store::MemoryStore;
pub use types::*;
