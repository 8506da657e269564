// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context builder: relevant memories for one inference call.

use tracing::debug;
use youclaw_config::model::MemoryConfig;
use youclaw_core::YouclawError;
use youclaw_memory::{MemoryStore, ScoredEntry};

/// Memories selected for a single request. Never cached; relevance depends
/// on the query that produced it.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub user_id: String,
    pub platform: String,
    /// Included entries, highest score first.
    pub entries: Vec<ScoredEntry>,
    /// Total characters of included entry text.
    pub used_chars: usize,
    pub budget: usize,
}

impl ConversationContext {
    pub fn empty(user_id: &str, platform: &str, budget: usize) -> Self {
        Self {
            user_id: user_id.to_string(),
            platform: platform.to_string(),
            entries: Vec::new(),
            used_chars: 0,
            budget,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Take entries in order while their cumulative text length fits `budget`.
///
/// Stops at the first entry that would overflow; entry text is never cut.
/// Returns the kept entries and the characters they use.
pub fn fit_to_budget(entries: Vec<ScoredEntry>, budget: usize) -> (Vec<ScoredEntry>, usize) {
    let mut used = 0usize;
    let mut kept = Vec::with_capacity(entries.len());
    for scored in entries {
        let size = scored.entry.text.chars().count();
        if used + size > budget {
            break;
        }
        used += size;
        kept.push(scored);
    }
    (kept, used)
}

/// Builds [`ConversationContext`]s from the memory store.
#[derive(Clone)]
pub struct ContextBuilder {
    memory: MemoryStore,
    max_entries: usize,
    min_score: Option<f32>,
}

impl ContextBuilder {
    /// `max_entries` bounds how many candidates are considered per request.
    pub fn new(memory: MemoryStore, max_entries: usize) -> Self {
        Self {
            memory,
            max_entries,
            min_score: None,
        }
    }

    pub fn from_config(memory: MemoryStore, config: &MemoryConfig) -> Self {
        Self::new(memory, config.max_context_entries)
            .with_min_score(config.similarity_threshold)
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Select the memories most relevant to `incoming_text` that fit in
    /// `budget` characters. No qualifying entries yields an empty context.
    pub async fn build(
        &self,
        user_id: &str,
        incoming_text: &str,
        platform: &str,
        budget: usize,
    ) -> Result<ConversationContext, YouclawError> {
        if budget == 0 || self.max_entries == 0 {
            return Ok(ConversationContext::empty(user_id, platform, budget));
        }

        let candidates = self
            .memory
            .query_similar(user_id, incoming_text, self.max_entries, self.min_score)
            .await?;
        let considered = candidates.len();
        let (entries, used_chars) = fit_to_budget(candidates, budget);

        debug!(
            user_id,
            platform,
            considered,
            included = entries.len(),
            used_chars,
            budget,
            "context built"
        );

        Ok(ConversationContext {
            user_id: user_id.to_string(),
            platform: platform.to_string(),
            entries,
            used_chars,
            budget,
        })
    }
}
