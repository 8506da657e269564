// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use youclaw_core::{MemorySource, Role};

/// One remembered fact or exchange. Immutable once written.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryEntry {
    pub id: String,
    /// Owner. Entries are never visible to other users.
    pub user_id: String,
    pub text: String,
    /// Normalized embedding of `text`.
    #[serde(skip)]
    pub vector: Vec<f32>,
    pub source: MemorySource,
    /// Non-decreasing within one user's entries.
    pub created_at: DateTime<Utc>,
    /// Surface that produced the entry.
    pub platform: Option<String>,
    /// Speaker, for conversational entries.
    pub role: Option<Role>,
    /// Insertion sequence; orders entries sharing a `created_at`.
    #[serde(skip)]
    pub seq: i64,
}

/// An entry paired with its similarity to a query.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: MemoryEntry,
    pub score: f32,
}

/// Parameters for [`MemoryStore::write_entry`](crate::MemoryStore::write_entry).
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub user_id: String,
    pub text: String,
    pub source: MemorySource,
    pub platform: Option<String>,
    pub role: Option<Role>,
}

impl NewMemory {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>, source: MemorySource) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            source,
            platform: None,
            role: None,
        }
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

/// Aggregate memory statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub total_entries: u64,
    pub unique_users: u64,
}

/// Convert f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert SQLite BLOB back to f32 vector. Trailing partial chunks are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity in [-1, 1]. Zero-magnitude or mismatched inputs score 0.
///
/// Stored vectors are unit length, so this reduces to the dot product.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0)
}
