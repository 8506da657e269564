// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic bag-of-words embedder.
//!
//! Each non-stopword token is hashed (FNV-1a) into one of `dimensions`
//! buckets. Texts sharing content words get a high cosine similarity, which
//! is enough to exercise recall without a model.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use youclaw_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, PluginAdapter,
    YouclawError,
};

pub const DEFAULT_DIMENSIONS: usize = 64;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "do", "does", "for", "i", "in", "is", "it", "me", "my", "of", "on",
    "s", "the", "to", "was", "what", "whats", "you", "your",
];

pub struct MockEmbedder {
    dimensions: usize,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// While set, every call fails with `EmbeddingUnavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Adapter calls so far, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The raw (unnormalized) vector for `text`.
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return v;
        }
        for token in tokens(text) {
            let bucket = (fnv1a(token.as_bytes()) % self.dimensions as u64) as usize;
            v[bucket] += 1.0;
        }
        v
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, YouclawError> {
        if self.failing.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("mock embedder failing".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), YouclawError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, YouclawError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(YouclawError::embedding("mock embedder offline"));
        }
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.vector(t)).collect(),
            dimensions: self.dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        dot / (na * nb)
    }

    #[test]
    fn stopwords_and_case_are_ignored() {
        let e = MockEmbedder::new();
        assert_eq!(e.vector("The Color BLUE"), e.vector("color blue"));
        assert!(e.vector("what is my").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn related_sentences_score_higher_than_unrelated() {
        let e = MockEmbedder::new();
        let fact = e.vector("My favorite color is blue");
        let question = e.vector("What's my favorite color?");
        let other = e.vector("Remind me to water the plants");
        assert!(cosine(&fact, &question) > 0.7);
        assert!(cosine(&fact, &question) > cosine(&other, &question));
    }

    #[tokio::test]
    async fn failing_embedder_reports_unavailable() {
        let e = MockEmbedder::with_dimensions(8);
        e.set_failing(true);
        let err = e
            .embed(EmbeddingInput {
                texts: vec!["x".into()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, YouclawError::EmbeddingUnavailable { .. }));
        assert_eq!(e.call_count(), 1);
    }
}
