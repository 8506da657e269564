// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat front of the YouClaw assistant.
//!
//! The [`AgentLoop`] receives messages from every registered channel, hands
//! each one to the [`MessageRouter`], and sends the reply back where the
//! message came from. Messages are handled concurrently; ordering within a
//! user is kept by the router's inference lane.

pub mod commands;
pub mod registry;
pub mod router;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use youclaw_core::{InboundMessage, OutboundMessage, YouclawError};

pub use commands::{Command, parse_command};
pub use registry::ChannelRegistry;
pub use router::{MessageRouter, RouterSettings};

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AgentLoop {
    registry: Arc<ChannelRegistry>,
    router: Arc<MessageRouter>,
    drain_timeout: Duration,
}

impl AgentLoop {
    pub fn new(registry: Arc<ChannelRegistry>, router: Arc<MessageRouter>) -> Self {
        Self {
            registry,
            router,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Runs until cancelled or until every channel has closed.
    ///
    /// On exit, in-flight replies are drained and the channels shut down.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), YouclawError> {
        info!(platforms = ?self.registry.platforms(), "agent loop running");
        let mut inflight = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
                msg = self.registry.next_message() => {
                    let Some(inbound) = msg else {
                        info!("all channels closed, stopping agent loop");
                        break;
                    };
                    let registry = Arc::clone(&self.registry);
                    let router = Arc::clone(&self.router);
                    inflight.spawn(async move { reply(&registry, &router, inbound).await });
                }
                Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "message handler aborted");
                    }
                }
            }
        }

        shutdown::drain_in_flight(&mut inflight, self.drain_timeout).await;
        self.registry.shutdown().await;
        info!("agent loop stopped");
        Ok(())
    }
}

async fn reply(registry: &ChannelRegistry, router: &MessageRouter, inbound: InboundMessage) {
    debug!(
        platform = %inbound.platform,
        user_id = %inbound.user_id,
        message_id = %inbound.id,
        "handling inbound message"
    );
    let text = router
        .handle(&inbound.platform, &inbound.user_id, &inbound.text)
        .await;
    let outbound = OutboundMessage {
        channel: inbound.channel,
        text,
        reply_to: Some(inbound.id),
    };
    if let Err(e) = registry.send(&inbound.platform, outbound).await {
        warn!(
            platform = %inbound.platform,
            user_id = %inbound.user_id,
            error = %e,
            "failed to send reply"
        );
    }
}
