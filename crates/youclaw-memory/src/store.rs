// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user memory store.
//!
//! Entries are embedded on write and never mutated afterwards. Similarity
//! queries scan the owner's live vectors linearly; a personal assistant holds
//! thousands of entries per user, not millions.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use youclaw_core::{HealthStatus, MemorySource, Role, YouclawError};
use youclaw_storage::Database;
use youclaw_storage::queries::memories as queries;
use youclaw_storage::{MemoryRow, NewMemoryRow, format_timestamp, parse_timestamp};

use crate::embedder::EmbeddingClient;
use crate::types::{
    MemoryEntry, MemoryStats, NewMemory, ScoredEntry, blob_to_vec, cosine_similarity,
    vec_to_blob,
};

/// Source of wall-clock time for new entries.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Semantic memory for all users, isolated per `user_id`.
#[derive(Clone)]
pub struct MemoryStore {
    db: Database,
    embedder: EmbeddingClient,
    default_min_score: f32,
    clock: Clock,
    /// Last `created_at` handed out per user. The mutex also serializes the
    /// insert so timestamps and rowids agree.
    watermarks: Arc<DashMap<String, Arc<Mutex<Option<DateTime<Utc>>>>>>,
}

impl MemoryStore {
    pub fn new(db: Database, embedder: EmbeddingClient, default_min_score: f32) -> Self {
        Self {
            db,
            embedder,
            default_min_score,
            clock: Arc::new(Utc::now),
            watermarks: Arc::new(DashMap::new()),
        }
    }

    /// Replace the wall clock used to stamp new entries.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    pub fn default_min_score(&self) -> f32 {
        self.default_min_score
    }

    /// Persist a new entry for `user_id`.
    pub async fn write(
        &self,
        user_id: &str,
        text: &str,
        source: MemorySource,
        platform: Option<&str>,
    ) -> Result<MemoryEntry, YouclawError> {
        let mut new = NewMemory::new(user_id, text, source);
        new.platform = platform.map(str::to_string);
        self.write_entry(new).await
    }

    /// Persist a new entry, embedding its text first.
    ///
    /// Nothing is written if embedding fails.
    pub async fn write_entry(&self, new: NewMemory) -> Result<MemoryEntry, YouclawError> {
        let user_id = new.user_id.clone();
        let mut written = self.write_batch(&user_id, vec![new]).await?;
        written
            .pop()
            .ok_or_else(|| YouclawError::Internal("memory insert returned no entry".into()))
    }

    /// Persist a user message and the assistant reply to it as one unit.
    ///
    /// Both texts are validated and embedded before anything is stored, and
    /// both rows land in a single transaction: either the exchange is
    /// remembered whole or not at all.
    pub async fn write_exchange(
        &self,
        user_id: &str,
        user_text: &str,
        reply: &str,
        platform: Option<&str>,
    ) -> Result<(MemoryEntry, MemoryEntry), YouclawError> {
        let entry = |text: &str, role: Role| {
            let mut new = NewMemory::new(user_id, text, MemorySource::Conversation).role(role);
            new.platform = platform.map(str::to_string);
            new
        };
        let written = self
            .write_batch(
                user_id,
                vec![entry(user_text, Role::User), entry(reply, Role::Assistant)],
            )
            .await?;
        match <[MemoryEntry; 2]>::try_from(written) {
            Ok([question, answer]) => Ok((question, answer)),
            Err(_) => Err(YouclawError::Internal(
                "memory insert returned the wrong number of entries".into(),
            )),
        }
    }

    async fn write_batch(
        &self,
        user_id: &str,
        batch: Vec<NewMemory>,
    ) -> Result<Vec<MemoryEntry>, YouclawError> {
        validate_user(user_id)?;
        for new in &batch {
            if new.user_id != user_id {
                return Err(YouclawError::InvalidInput(
                    "memory batch spans more than one user".into(),
                ));
            }
            if new.text.trim().is_empty() {
                return Err(YouclawError::InvalidInput("memory text is empty".into()));
            }
        }

        let mut vectors = Vec::with_capacity(batch.len());
        for new in &batch {
            vectors.push(self.embedder.embed(&new.text).await?);
        }

        let clock = self.user_clock(user_id);
        let mut last = clock.lock().await;
        if last.is_none() {
            *last = queries::latest_created_at(&self.db, user_id)
                .await?
                .map(|raw| parse_timestamp(&raw))
                .transpose()?;
        }
        let now = (self.clock)().trunc_subsecs(3);
        let created_at = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };

        let entries: Vec<(String, NewMemory, Vec<f32>)> = batch
            .into_iter()
            .zip(vectors)
            .map(|(new, vector)| (uuid::Uuid::new_v4().to_string(), new, vector))
            .collect();
        let rows = entries
            .iter()
            .map(|(id, new, vector)| NewMemoryRow {
                id: id.clone(),
                user_id: new.user_id.clone(),
                text: new.text.clone(),
                embedding: vec_to_blob(vector),
                dimensions: vector.len() as i64,
                source: new.source.as_str().to_string(),
                platform: new.platform.clone(),
                role: new.role.map(|r| r.as_str().to_string()),
                created_at: format_timestamp(created_at),
            })
            .collect();
        let seqs = queries::insert_memories(&self.db, rows).await?;
        *last = Some(created_at);
        drop(last);

        Ok(entries
            .into_iter()
            .zip(seqs)
            .map(|((id, new, vector), seq)| {
                debug!(user_id = %new.user_id, memory_id = %id, source = new.source.as_str(), "memory written");
                MemoryEntry {
                    id,
                    user_id: new.user_id,
                    text: new.text,
                    vector,
                    source: new.source,
                    created_at,
                    platform: new.platform,
                    role: new.role,
                    seq,
                }
            })
            .collect())
    }

    /// Up to `k` of the user's live entries most similar to `query_text`.
    ///
    /// Results are ordered by score descending, ties broken by newer
    /// `created_at`, then by later insertion. Entries scoring below
    /// `min_score` (the store default when `None`) are dropped.
    pub async fn query_similar(
        &self,
        user_id: &str,
        query_text: &str,
        k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<ScoredEntry>, YouclawError> {
        validate_user(user_id)?;
        if query_text.trim().is_empty() {
            return Err(YouclawError::InvalidInput("query text is empty".into()));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let rows = queries::live_memories_for_user(&self.db, user_id, self.dimensions()).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(query_text).await?;
        let min_score = min_score.unwrap_or(self.default_min_score);

        let mut scored = rows
            .into_iter()
            .map(row_to_entry)
            .filter_map(|entry| match entry {
                Ok(entry) => {
                    let score = cosine_similarity(&query, &entry.vector);
                    (score >= min_score).then_some(Ok(ScoredEntry { entry, score }))
                }
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        scored.sort_by(rank);
        scored.truncate(k);

        debug!(user_id, k, hits = scored.len(), "similarity query");
        Ok(scored)
    }

    /// Fetch one live entry owned by `user_id`.
    pub async fn get(&self, entry_id: &str, user_id: &str) -> Result<MemoryEntry, YouclawError> {
        match queries::get_memory(&self.db, entry_id, user_id).await? {
            Some(row) => row_to_entry(row),
            None => Err(not_found(entry_id)),
        }
    }

    /// Tombstone an entry. Fails with `NotFound` if it is absent, already
    /// deleted, or owned by another user.
    pub async fn delete(&self, entry_id: &str, user_id: &str) -> Result<(), YouclawError> {
        let now = format_timestamp((self.clock)());
        if queries::tombstone_memory(&self.db, entry_id, user_id, &now).await? {
            info!(user_id, memory_id = entry_id, "memory deleted");
            Ok(())
        } else {
            Err(not_found(entry_id))
        }
    }

    /// Newest live entries of a user, newest first.
    pub async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<MemoryEntry>, YouclawError> {
        queries::recent_memories(&self.db, user_id, limit)
            .await?
            .into_iter()
            .map(row_to_entry)
            .collect()
    }

    /// Tombstone every live entry of a user, returning how many were removed.
    pub async fn clear_user(&self, user_id: &str) -> Result<usize, YouclawError> {
        validate_user(user_id)?;
        let now = format_timestamp((self.clock)());
        let removed = queries::tombstone_all_for_user(&self.db, user_id, &now).await?;
        info!(user_id, removed, "memory cleared");
        Ok(removed)
    }

    /// Live entry and distinct-user counts.
    pub async fn stats(&self) -> Result<MemoryStats, YouclawError> {
        let counts = queries::memory_counts(&self.db).await?;
        Ok(MemoryStats {
            total_entries: counts.total_entries,
            unique_users: counts.unique_users,
        })
    }

    pub async fn embedding_health(&self) -> HealthStatus {
        self.embedder.health().await
    }

    /// Live entry count for one user.
    pub async fn count(&self, user_id: &str) -> Result<u64, YouclawError> {
        queries::count_for_user(&self.db, user_id).await
    }

    fn user_clock(&self, user_id: &str) -> Arc<Mutex<Option<DateTime<Utc>>>> {
        self.watermarks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }
}

fn rank(a: &ScoredEntry, b: &ScoredEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
        .then_with(|| b.entry.seq.cmp(&a.entry.seq))
}

fn validate_user(user_id: &str) -> Result<(), YouclawError> {
    if user_id.trim().is_empty() {
        return Err(YouclawError::InvalidInput("user_id is empty".into()));
    }
    Ok(())
}

fn not_found(entry_id: &str) -> YouclawError {
    YouclawError::NotFound {
        entity: "memory",
        id: entry_id.to_string(),
    }
}

fn row_to_entry(row: MemoryRow) -> Result<MemoryEntry, YouclawError> {
    Ok(MemoryEntry {
        created_at: parse_timestamp(&row.created_at)?,
        vector: blob_to_vec(&row.embedding),
        source: MemorySource::from_str_value(&row.source),
        role: row.role.as_deref().and_then(Role::from_str_value),
        id: row.id,
        user_id: row.user_id,
        text: row.text,
        platform: row.platform,
        seq: row.seq,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(score: f32, created_ms: i64, seq: i64) -> ScoredEntry {
        ScoredEntry {
            entry: MemoryEntry {
                id: format!("m{seq}"),
                user_id: "u".into(),
                text: "t".into(),
                vector: vec![],
                source: MemorySource::Manual,
                created_at: DateTime::from_timestamp_millis(created_ms).unwrap(),
                platform: None,
                role: None,
                seq,
            },
            score,
        }
    }

    #[test]
    fn rank_orders_by_score_then_recency_then_sequence() {
        let mut v = vec![
            scored(0.5, 1_000, 1),
            scored(0.9, 1_000, 2),
            scored(0.5, 2_000, 3),
            scored(0.5, 2_000, 4),
        ];
        v.sort_by(rank);
        let ids: Vec<_> = v.iter().map(|s| s.entry.id.as_str()).collect();
        assert_eq!(ids, ["m2", "m4", "m3", "m1"]);
    }
}
