// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for chat surfaces (Telegram, Discord, console, ...).

use async_trait::async_trait;

use crate::error::YouclawError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, InboundMessage, MessageId, OutboundMessage};

/// Adapter for bidirectional messaging channel integrations.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), YouclawError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, YouclawError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, YouclawError>;
}
