// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inference dispatcher.
//!
//! At most one completion per user is in flight; further calls for the same
//! user queue behind it. The caller's timeout bounds the wait for the lane
//! plus the completion itself. Completions are never retried here.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use youclaw_core::types::ProviderRequest;
use youclaw_core::{HealthStatus, ProviderAdapter, YouclawError};

use crate::lanes::{UserLaneGuard, UserLanes};

/// Serializes completions per user and applies caller deadlines.
pub struct InferenceDispatcher {
    provider: Arc<dyn ProviderAdapter>,
    lanes: UserLanes,
    /// Model used for requests that do not name one; `None` leaves the
    /// provider's configured model in charge.
    active_model: RwLock<Option<String>>,
}

impl InferenceDispatcher {
    pub fn new(provider: Arc<dyn ProviderAdapter>) -> Self {
        Self {
            provider,
            lanes: UserLanes::new(),
            active_model: RwLock::new(None),
        }
    }

    /// Name of the underlying provider, for status output.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// The switched-to model, if any.
    pub fn active_model(&self) -> Option<String> {
        self.active_model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch every later completion to `model`, or back to the provider's
    /// default with `None`. Completions already running keep their model.
    pub fn set_active_model(&self, model: Option<String>) {
        info!(model = model.as_deref().unwrap_or("default"), "active model switched");
        *self
            .active_model
            .write()
            .unwrap_or_else(PoisonError::into_inner) = model;
    }

    /// Models the provider can serve.
    pub async fn list_models(&self) -> Result<Vec<String>, YouclawError> {
        self.provider.list_models().await.map_err(into_inference_error)
    }

    /// Provider health; a failing check counts as unhealthy.
    pub async fn health(&self) -> HealthStatus {
        match self.provider.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }

    /// Wait for `user_id`'s lane, giving up once `timeout` has elapsed.
    ///
    /// The returned lane keeps the user's slot until it is dropped, so a
    /// caller can run a completion and persist its result before any other
    /// inference for the same user starts.
    pub async fn acquire(
        &self,
        user_id: &str,
        timeout: Duration,
    ) -> Result<InferenceLane<'_>, YouclawError> {
        let deadline = Instant::now() + timeout;
        let guard = match tokio::time::timeout_at(deadline, self.lanes.acquire(user_id)).await {
            Ok(guard) => guard?,
            Err(_) => {
                warn!(user_id, timeout_ms = timeout.as_millis() as u64, "timed out waiting for user lane");
                return Err(YouclawError::InferenceTimeout { duration: timeout });
            }
        };
        Ok(InferenceLane {
            provider: self.provider.as_ref(),
            model: self.active_model(),
            guard,
            deadline,
            timeout,
        })
    }

    /// Run one completion for `user_id` under its lane and return the text.
    pub async fn complete(
        &self,
        request: ProviderRequest,
        user_id: &str,
        timeout: Duration,
    ) -> Result<String, YouclawError> {
        let lane = self.acquire(user_id, timeout).await?;
        lane.complete(request).await
    }

    /// Whether `user_id` currently has a completion in flight.
    pub fn is_busy(&self, user_id: &str) -> bool {
        self.lanes.is_busy(user_id)
    }

    /// Forget lanes of users with nothing in flight.
    pub fn prune_idle(&self) -> usize {
        self.lanes.prune_idle()
    }
}

/// A held per-user slot with the deadline it was acquired under.
pub struct InferenceLane<'a> {
    provider: &'a dyn ProviderAdapter,
    model: Option<String>,
    guard: UserLaneGuard,
    deadline: Instant,
    timeout: Duration,
}

impl InferenceLane<'_> {
    pub fn user_id(&self) -> &str {
        self.guard.user_id()
    }

    /// Time left before the caller's deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Run a completion before the lane's deadline.
    ///
    /// On timeout the in-flight request is abandoned; the slot is freed when
    /// the lane drops.
    pub async fn complete(&self, mut request: ProviderRequest) -> Result<String, YouclawError> {
        let user_id = self.user_id();
        if request.model.is_none() {
            request.model = self.model.clone();
        }
        let started = Instant::now();
        debug!(user_id, prompt_chars = request.prompt.chars().count(), "dispatching completion");

        match tokio::time::timeout_at(self.deadline, self.provider.complete(request)).await {
            Ok(Ok(response)) => {
                info!(
                    user_id,
                    model = %response.model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "completion finished"
                );
                Ok(response.text)
            }
            Ok(Err(err)) => {
                warn!(user_id, error = %err, "completion failed");
                Err(into_inference_error(err))
            }
            Err(_) => {
                warn!(user_id, timeout_ms = self.timeout.as_millis() as u64, "completion timed out");
                Err(YouclawError::InferenceTimeout {
                    duration: self.timeout,
                })
            }
        }
    }
}

/// Provider failures surface as `InferenceUnavailable` unless already classified.
fn into_inference_error(err: YouclawError) -> YouclawError {
    match err {
        YouclawError::InferenceUnavailable { .. } | YouclawError::InferenceTimeout { .. } => err,
        other => YouclawError::InferenceUnavailable {
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}
