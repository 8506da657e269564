// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding client: one text in, one normalized vector of the configured
//! dimension out.

use std::sync::Arc;
use std::time::Duration;

use youclaw_config::model::MemoryConfig;
use youclaw_core::{EmbeddingAdapter, EmbeddingInput, HealthStatus, YouclawError};
use youclaw_resilience::RetryPolicy;

/// L2-normalize a vector in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Wraps an [`EmbeddingAdapter`] with timeouts, retries and shape checks.
#[derive(Clone)]
pub struct EmbeddingClient {
    adapter: Arc<dyn EmbeddingAdapter>,
    dimensions: usize,
    attempt_timeout: Duration,
    policy: RetryPolicy,
}

impl EmbeddingClient {
    pub fn new(
        adapter: Arc<dyn EmbeddingAdapter>,
        dimensions: usize,
        attempt_timeout: Duration,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            adapter,
            dimensions,
            attempt_timeout,
            policy,
        }
    }

    pub fn from_config(adapter: Arc<dyn EmbeddingAdapter>, config: &MemoryConfig) -> Self {
        Self::new(
            adapter,
            config.embedding_dimensions,
            Duration::from_secs(config.embed_timeout_secs),
            RetryPolicy::new(
                config.embed_max_attempts,
                Duration::from_millis(config.embed_initial_backoff_ms),
            ),
        )
    }

    /// Fixed vector dimension every stored and query vector must have.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Health of the embedding service; a failing check counts as unhealthy.
    pub async fn health(&self) -> HealthStatus {
        match self.adapter.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }

    /// Embed one text.
    ///
    /// Unreachable, slow, or malformed responses are retried per the policy and
    /// surface as [`YouclawError::EmbeddingUnavailable`]. A well-formed vector
    /// of the wrong length fails immediately with
    /// [`YouclawError::DimensionMismatch`].
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, YouclawError> {
        let mut vector = self
            .policy
            .run("embed", || self.embed_once(text))
            .await?;
        l2_normalize(&mut vector);
        Ok(vector)
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, YouclawError> {
        let input = EmbeddingInput {
            texts: vec![text.to_string()],
        };
        let output = tokio::time::timeout(self.attempt_timeout, self.adapter.embed(input))
            .await
            .map_err(|_| {
                YouclawError::embedding(format!(
                    "no response within {:?}",
                    self.attempt_timeout
                ))
            })?
            .map_err(into_embedding_error)?;

        let count = output.embeddings.len();
        let Some(vector) = output.embeddings.into_iter().next() else {
            return Err(YouclawError::embedding("response contained no vectors"));
        };
        if count != 1 {
            return Err(YouclawError::embedding(format!(
                "expected 1 vector, got {count}"
            )));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(YouclawError::embedding("response contained non-finite values"));
        }
        if vector.len() != self.dimensions {
            return Err(YouclawError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

fn into_embedding_error(err: YouclawError) -> YouclawError {
    match err {
        e @ (YouclawError::EmbeddingUnavailable { .. } | YouclawError::DimensionMismatch { .. }) => e,
        other => YouclawError::EmbeddingUnavailable {
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use youclaw_core::{AdapterType, EmbeddingOutput, HealthStatus, PluginAdapter};

    use super::*;

    /// Replays a scripted sequence of results, repeating the last one.
    struct Scripted {
        script: Mutex<Vec<Result<Vec<Vec<f32>>, YouclawError>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl Scripted {
        fn new(script: Vec<Result<Vec<Vec<f32>>, YouclawError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl PluginAdapter for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Embedding
        }
        async fn health_check(&self) -> Result<HealthStatus, YouclawError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), YouclawError> {
            Ok(())
        }
    }

    #[async_trait]
    impl EmbeddingAdapter for Scripted {
        async fn embed(&self, _input: EmbeddingInput) -> Result<EmbeddingOutput, YouclawError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 {
                    script.remove(0)
                } else {
                    match &script[0] {
                        Ok(v) => Ok(v.clone()),
                        Err(e) => Err(YouclawError::embedding(e.to_string())),
                    }
                }
            };
            next.map(|embeddings| EmbeddingOutput {
                dimensions: embeddings.first().map_or(0, Vec::len),
                embeddings,
            })
        }
    }

    fn client(adapter: Arc<Scripted>, dims: usize) -> EmbeddingClient {
        EmbeddingClient::new(
            adapter,
            dims,
            Duration::from_secs(1),
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
    }

    #[test]
    fn l2_normalize_produces_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn embed_returns_normalized_vector() {
        let adapter = Arc::new(Scripted::new(vec![Ok(vec![vec![0.0, 2.0, 0.0]])]));
        let v = client(adapter, 3).embed("hello").await.unwrap();
        assert_eq!(v, vec![0.0, 1.0, 0.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_is_retried() {
        let adapter = Arc::new(Scripted::new(vec![
            Err(YouclawError::embedding("connection refused")),
            Ok(vec![vec![1.0, 0.0]]),
        ]));
        let v = client(adapter.clone(), 2).embed("hello").await.unwrap();
        assert_eq!(v, vec![1.0, 0.0]);
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_failure_exhausts_attempts() {
        let adapter = Arc::new(Scripted::new(vec![Err(YouclawError::embedding("down"))]));
        let err = client(adapter.clone(), 2).embed("hello").await.unwrap_err();
        assert!(matches!(err, YouclawError::EmbeddingUnavailable { .. }));
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_dimension_fails_without_retry() {
        let adapter = Arc::new(Scripted::new(vec![Ok(vec![vec![1.0, 0.0, 0.0]])]));
        let err = client(adapter.clone(), 2).embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            YouclawError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_response_is_unavailable() {
        let adapter = Arc::new(Scripted::new(vec![Ok(vec![])]));
        let err = client(adapter, 2).embed("hello").await.unwrap_err();
        assert!(matches!(err, YouclawError::EmbeddingUnavailable { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_adapter_times_out_per_attempt() {
        let mut scripted = Scripted::new(vec![Ok(vec![vec![1.0, 0.0]])]);
        scripted.delay = Duration::from_secs(5);
        let adapter = Arc::new(scripted);
        let err = client(adapter.clone(), 2).embed("hello").await.unwrap_err();
        assert!(matches!(err, YouclawError::EmbeddingUnavailable { .. }));
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn foreign_errors_become_unavailable() {
        let err = into_embedding_error(YouclawError::Internal("boom".into()));
        assert!(matches!(err, YouclawError::EmbeddingUnavailable { .. }));
    }
}
