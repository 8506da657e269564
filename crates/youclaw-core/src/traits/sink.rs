// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery seam used by the task scheduler.

use async_trait::async_trait;

use crate::error::YouclawError;
use crate::types::{DeliveryTarget, MessageId};

/// Delivers text to a platform/channel pair without knowing which adapter serves it.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Delivers `text` to `target`.
    ///
    /// Fails with [`YouclawError::Channel`] when no adapter serves the
    /// platform or the adapter rejects the message.
    async fn deliver(&self, target: &DeliveryTarget, text: &str)
    -> Result<MessageId, YouclawError>;
}
