// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`EmbeddingAdapter`] backed by Ollama's embedding endpoints.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use youclaw_config::model::OllamaConfig;
use youclaw_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, PluginAdapter,
    YouclawError,
};

use crate::client::OllamaClient;

pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(config: &OllamaConfig) -> Result<Self, YouclawError> {
        Ok(Self {
            client: OllamaClient::new(
                &config.host,
                Duration::from_secs(config.request_timeout_secs),
            )?,
            model: config.embedding_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl PluginAdapter for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama-embed"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, YouclawError> {
        match self.client.embed(&self.model, &["ping".to_string()]).await {
            Ok(v) if v.first().is_some_and(|e| !e.is_empty()) => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Degraded("empty embedding".into())),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), YouclawError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OllamaEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, YouclawError> {
        let embeddings = self.client.embed(&self.model, &input.texts).await?;
        if embeddings.len() != input.texts.len() {
            return Err(YouclawError::embedding(format!(
                "expected {} vectors, got {}",
                input.texts.len(),
                embeddings.len()
            )));
        }
        let dimensions = embeddings.first().map_or(0, Vec::len);
        debug!(model = %self.model, count = embeddings.len(), dimensions, "embedded");
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}
