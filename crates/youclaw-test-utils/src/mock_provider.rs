// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapter for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured responses,
//! an optional artificial delay, and a failure switch. Every request is
//! recorded so tests can inspect the prompts that reached the model.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use youclaw_core::{
    AdapterType, HealthStatus, PluginAdapter, ProviderAdapter, ProviderRequest, ProviderResponse,
    YouclawError,
};

type Responder = Arc<dyn Fn(&ProviderRequest) -> String + Send + Sync>;

/// A mock LLM provider.
///
/// Responses are popped from a FIFO queue. When the queue is empty the
/// responder closure answers if one is set, otherwise the text
/// "mock response" is returned.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    responder: Option<Responder>,
    requests: StdMutex<Vec<ProviderRequest>>,
    models: StdMutex<Vec<String>>,
    delay: StdMutex<Duration>,
    failing: AtomicBool,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockProvider {
    /// Create a new mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            responder: None,
            requests: StdMutex::new(Vec::new()),
            models: StdMutex::new(vec!["mock-model".to_string()]),
            delay: StdMutex::new(Duration::ZERO),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Create a mock provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        let provider = Self::new();
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..provider
        }
    }

    /// Answer with `f(request)` whenever the response queue is empty.
    pub fn with_responder<F>(mut self, f: F) -> Self
    where
        F: Fn(&ProviderRequest) -> String + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(f));
        self
    }

    /// Sleep this long inside every completion.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.set_delay(delay);
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        if let Ok(mut d) = self.delay.lock() {
            *d = delay;
        }
    }

    /// Replace the installed model list reported by `list_models`.
    pub fn set_models<I, S>(&self, models: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut m) = self.models.lock() {
            *m = models.into_iter().map(Into::into).collect();
        }
    }

    /// While set, every completion fails with `InferenceUnavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Add a response to the end of the queue.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(text.into());
    }

    /// Completions attempted so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in arrival order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Prompt of the most recent request.
    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .ok()
            .and_then(|r| r.last().map(|req| req.prompt.clone()))
    }

    /// Highest number of completions that were ever in flight at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    async fn next_response(&self, request: &ProviderRequest) -> String {
        if let Some(text) = self.responses.lock().await.pop_front() {
            return text;
        }
        match &self.responder {
            Some(f) => f(request),
            None => "mock response".to_string(),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, YouclawError> {
        if self.failing.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("mock provider failing".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), YouclawError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, YouclawError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let delay = self.delay.lock().map(|d| *d).unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(YouclawError::inference("mock provider is failing"));
        }
        let text = self.next_response(&request).await;
        Ok(ProviderResponse {
            text,
            model: request.model.unwrap_or_else(|| "mock-model".to_string()),
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, YouclawError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(YouclawError::inference("mock provider is failing"));
        }
        Ok(self.models.lock().map(|m| m.clone()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_responses_come_first_then_default() {
        let provider = MockProvider::with_responses(vec!["one".into()]);
        let first = provider.complete(ProviderRequest::new("a")).await.unwrap();
        let second = provider.complete(ProviderRequest::new("b")).await.unwrap();
        assert_eq!(first.text, "one");
        assert_eq!(second.text, "mock response");
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.last_prompt().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn reports_configured_models() {
        let provider = MockProvider::new();
        assert_eq!(provider.list_models().await.unwrap(), ["mock-model"]);
        provider.set_models(["llama3:latest", "qwen2.5:7b"]);
        assert_eq!(provider.list_models().await.unwrap(), ["llama3:latest", "qwen2.5:7b"]);
        provider.set_failing(true);
        assert!(provider.list_models().await.is_err());
    }

    #[tokio::test]
    async fn responder_sees_the_request() {
        let provider = MockProvider::new().with_responder(|req| req.prompt.to_uppercase());
        let reply = provider.complete(ProviderRequest::new("hey")).await.unwrap();
        assert_eq!(reply.text, "HEY");
    }

    #[tokio::test]
    async fn failing_provider_reports_unavailable() {
        let provider = MockProvider::new();
        provider.set_failing(true);
        let err = provider.complete(ProviderRequest::new("x")).await.unwrap_err();
        assert!(matches!(err, YouclawError::InferenceUnavailable { .. }));
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_calls_are_counted() {
        let provider = MockProvider::new().with_delay(Duration::from_millis(50));
        let (a, b) = tokio::join!(
            provider.complete(ProviderRequest::new("a")),
            provider.complete(ProviderRequest::new("b")),
        );
        a.unwrap();
        b.unwrap();
        assert_eq!(provider.max_concurrency(), 2);
    }
}
