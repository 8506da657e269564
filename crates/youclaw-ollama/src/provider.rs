// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`ProviderAdapter`] backed by Ollama's `/api/chat`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use youclaw_config::model::OllamaConfig;
use youclaw_core::{
    AdapterType, HealthStatus, PluginAdapter, ProviderAdapter, ProviderRequest, ProviderResponse,
    YouclawError, model_matches,
};

use crate::client::OllamaClient;
use crate::types::{ChatMessage, ChatOptions, ChatRequest};

/// Chat completions against a single configured Ollama model.
pub struct OllamaProvider {
    client: OllamaClient,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig) -> Result<Self, YouclawError> {
        let client = OllamaClient::new(
            &config.host,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!(host = %config.host, model = %config.chat_model, "Ollama provider initialized");
        Ok(Self {
            client,
            model: config.chat_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_chat_request(&self, request: ProviderRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt.filter(|s| !s.is_empty()) {
            messages.push(ChatMessage::new("system", system));
        }
        messages.push(ChatMessage::new("user", request.prompt));
        ChatRequest {
            model: request.model.unwrap_or_else(|| self.model.clone()),
            messages,
            stream: false,
            options: ChatOptions {
                temperature: Some(request.temperature.unwrap_or(self.temperature)),
                num_predict: Some(request.max_tokens.unwrap_or(self.max_tokens)),
            },
        }
    }
}

#[async_trait]
impl PluginAdapter for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, YouclawError> {
        match self.client.list_models().await {
            Ok(models) if models.iter().any(|m| model_matches(m, &self.model)) => {
                Ok(HealthStatus::Healthy)
            }
            Ok(_) => Ok(HealthStatus::Degraded(format!(
                "model {} is not installed",
                self.model
            ))),
            Err(e) => {
                warn!(error = %e, "Ollama health check failed");
                Ok(HealthStatus::Unhealthy(e.to_string()))
            }
        }
    }

    async fn shutdown(&self) -> Result<(), YouclawError> {
        debug!("Ollama provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OllamaProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, YouclawError> {
        let chat = self.to_chat_request(request);
        let response = self.client.chat(&chat).await?;
        let text = response.message.content.trim().to_string();
        if text.is_empty() {
            return Err(YouclawError::inference("model returned an empty reply"));
        }
        Ok(ProviderResponse {
            text,
            model: response.model,
        })
    }

    async fn list_models(&self) -> Result<Vec<String>, YouclawError> {
        self.client.list_models().await
    }
}
