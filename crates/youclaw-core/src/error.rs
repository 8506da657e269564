// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the YouClaw assistant runtime.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all YouClaw components.
#[derive(Debug, Error)]
pub enum YouclawError {
    /// Caller error (empty text, malformed schedule, bad identifier). Never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Referenced entity is absent or owned by a different user.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The embedding service failed after the retry policy was exhausted.
    #[error("embedding service unavailable: {message}")]
    EmbeddingUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An embedding had the wrong number of dimensions.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The inference service could not be reached or returned an error.
    #[error("inference service unavailable: {message}")]
    InferenceUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The caller-supplied inference timeout elapsed.
    #[error("inference timed out after {duration:?}")]
    InferenceTimeout { duration: Duration },

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Channel adapter errors (delivery failure, disconnected platform).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl YouclawError {
    /// Shorthand for an [`EmbeddingUnavailable`](Self::EmbeddingUnavailable) without a source.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for an [`InferenceUnavailable`](Self::InferenceUnavailable) without a source.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::InferenceUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`Channel`](Self::Channel) error without a source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }

    /// Transient external-dependency failures that a bounded retry may fix.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingUnavailable { .. } | Self::InferenceUnavailable { .. }
        )
    }

    /// The single reply shown to a chat user when handling their message failed.
    ///
    /// Never includes internal detail; the full error is logged instead.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "I couldn't process that message. Please send some text.",
            Self::InferenceTimeout { .. } => {
                "Sorry, that took too long to process. Please try again."
            }
            Self::InferenceUnavailable { .. } => {
                "Sorry, I'm having trouble connecting to my AI brain right now. Please try again in a moment."
            }
            Self::EmbeddingUnavailable { .. } | Self::DimensionMismatch { .. } => {
                "Sorry, my memory is unavailable right now. Please try again shortly."
            }
            _ => "Sorry, something went wrong while handling your message.",
        }
    }
}
