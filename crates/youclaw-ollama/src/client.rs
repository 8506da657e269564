// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a local or remote Ollama server.
//!
//! The client makes exactly one attempt per call. Retry decisions belong to
//! the caller: embeddings are retried by the memory layer, completions never.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, info};
use youclaw_core::YouclawError;

use crate::types::{
    ApiErrorResponse, ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, LegacyEmbedRequest,
    LegacyEmbedResponse, TagsResponse,
};

/// Outcome of a failed HTTP exchange, before it is assigned to a domain error.
#[derive(Debug)]
pub(crate) enum HttpFailure {
    Transport(reqwest::Error),
    Status { status: StatusCode, body: String },
    Decode(String),
}

impl HttpFailure {
    fn describe(&self) -> String {
        match self {
            Self::Transport(e) => format!("HTTP request failed: {e}"),
            Self::Status { status, body } => {
                match serde_json::from_str::<ApiErrorResponse>(body) {
                    Ok(api) => format!("Ollama returned {status}: {}", api.error),
                    Err(_) => format!("Ollama returned {status}: {body}"),
                }
            }
            Self::Decode(detail) => format!("failed to parse Ollama response: {detail}"),
        }
    }

    pub(crate) fn into_inference(self) -> YouclawError {
        let message = self.describe();
        match self {
            Self::Transport(e) => YouclawError::InferenceUnavailable {
                message,
                source: Some(Box::new(e)),
            },
            _ => YouclawError::inference(message),
        }
    }

    pub(crate) fn into_embedding(self) -> YouclawError {
        let message = self.describe();
        match self {
            Self::Transport(e) => YouclawError::EmbeddingUnavailable {
                message,
                source: Some(Box::new(e)),
            },
            _ => YouclawError::embedding(message),
        }
    }
}

/// Thin JSON client over the Ollama REST API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// `host` is the server root, e.g. `http://localhost:11434`.
    pub fn new(host: &str, request_timeout: Duration) -> Result<Self, YouclawError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| YouclawError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: host.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, HttpFailure>
    where
        Req: serde::Serialize + ?Sized,
        Resp: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(HttpFailure::Transport)?;
        decode(response).await
    }

    /// Non-streaming chat completion.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, YouclawError> {
        let started = std::time::Instant::now();
        let response: ChatResponse = self
            .post_json("/api/chat", request)
            .await
            .map_err(HttpFailure::into_inference)?;
        debug!(
            model = %response.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chat completion received"
        );
        Ok(response)
    }

    /// Embed a batch of texts, one vector per input in order.
    ///
    /// Falls back to the single-text `/api/embeddings` endpoint when the
    /// server does not know `/api/embed`.
    pub async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>, YouclawError> {
        let request = EmbedRequest {
            model: model.to_string(),
            input: texts.to_vec(),
        };
        match self.post_json::<_, EmbedResponse>("/api/embed", &request).await {
            Ok(resp) => Ok(resp.embeddings),
            Err(HttpFailure::Status { status, body })
                if status == StatusCode::NOT_FOUND
                    && serde_json::from_str::<ApiErrorResponse>(&body).is_err() =>
            {
                info!("server lacks /api/embed, using legacy /api/embeddings");
                self.embed_legacy(model, texts).await
            }
            Err(failure) => Err(failure.into_embedding()),
        }
    }

    async fn embed_legacy(
        &self,
        model: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, YouclawError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let request = LegacyEmbedRequest {
                model: model.to_string(),
                prompt: text.clone(),
            };
            let resp: LegacyEmbedResponse = self
                .post_json("/api/embeddings", &request)
                .await
                .map_err(HttpFailure::into_embedding)?;
            out.push(resp.embedding);
        }
        Ok(out)
    }

    /// Names of the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>, YouclawError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(HttpFailure::Transport)
            .map_err(HttpFailure::into_inference)?;
        let tags: TagsResponse = decode(response)
            .await
            .map_err(HttpFailure::into_inference)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

async fn decode<Resp: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Resp, HttpFailure> {
    let status = response.status();
    let body = response.text().await.map_err(HttpFailure::Transport)?;
    if !status.is_success() {
        return Err(HttpFailure::Status { status, body });
    }
    serde_json::from_str(&body).map_err(|e| HttpFailure::Decode(e.to_string()))
}
