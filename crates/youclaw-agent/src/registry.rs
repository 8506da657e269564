// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel registry that fans in every platform adapter.
//!
//! On `connect_all`, each adapter is connected and a background task
//! forwards its inbound messages to a shared mpsc channel, tagged with the
//! adapter's platform name. Outbound messages, replies and scheduled
//! deliveries alike, are routed by platform name.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use youclaw_core::{
    ChannelAdapter, DeliveryTarget, HealthStatus, InboundMessage, MessageId, MessageSink,
    OutboundMessage, YouclawError,
};

const INBOUND_BUFFER: usize = 512;
const RECEIVE_ERROR_PAUSE: Duration = Duration::from_millis(250);

pub struct ChannelRegistry {
    /// Adapters added but not yet connected.
    pending: Vec<Box<dyn ChannelAdapter>>,
    connected: HashMap<String, Arc<dyn ChannelAdapter>>,
    inbound_rx: Mutex<mpsc::Receiver<InboundMessage>>,
    /// Dropped once every receive task holds a clone, so the inbound
    /// channel closes when the last adapter stops.
    inbound_tx: Option<mpsc::Sender<InboundMessage>>,
    receivers: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        Self {
            pending: Vec::new(),
            connected: HashMap::new(),
            inbound_rx: Mutex::new(inbound_rx),
            inbound_tx: Some(inbound_tx),
            receivers: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Register an adapter under its `name()`. Must be called before
    /// [`connect_all`](Self::connect_all).
    pub fn add_channel(&mut self, channel: Box<dyn ChannelAdapter>) {
        self.pending.push(channel);
    }

    /// Number of registered adapters, connected or not.
    pub fn channel_count(&self) -> usize {
        self.pending.len() + self.connected.len()
    }

    /// Connect every pending adapter and start forwarding its messages.
    pub async fn connect_all(&mut self) -> Result<(), YouclawError> {
        let Some(tx) = self.inbound_tx.take() else {
            return Err(YouclawError::Internal(
                "channel registry already connected".into(),
            ));
        };

        let mut handles = Vec::new();
        for mut channel in std::mem::take(&mut self.pending) {
            channel.connect().await?;
            let platform = channel.name().to_string();
            info!(platform = %platform, "channel connected");

            let channel: Arc<dyn ChannelAdapter> = Arc::from(channel);
            if self.connected.insert(platform.clone(), Arc::clone(&channel)).is_some() {
                warn!(platform = %platform, "duplicate platform name, previous adapter replaced");
            }
            handles.push(tokio::spawn(forward_inbound(platform, channel, tx.clone())));
        }

        if let Ok(mut receivers) = self.receivers.lock() {
            receivers.extend(handles);
        }
        info!(channels = self.connected.len(), "channel registry connected");
        Ok(())
    }

    /// Registered platform names, sorted.
    pub fn platforms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.connected.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn channel(&self, platform: &str) -> Option<Arc<dyn ChannelAdapter>> {
        self.connected.get(platform).cloned()
    }

    /// Next inbound message from any channel, or `None` once every channel
    /// has closed.
    pub async fn next_message(&self) -> Option<InboundMessage> {
        self.inbound_rx.lock().await.recv().await
    }

    /// Send through the adapter registered for `platform`.
    pub async fn send(
        &self,
        platform: &str,
        msg: OutboundMessage,
    ) -> Result<MessageId, YouclawError> {
        let channel = self.channel(platform).ok_or_else(|| {
            YouclawError::channel(format!("no channel registered for platform '{platform}'"))
        })?;
        channel.send(msg).await
    }

    /// Worst status across all connected adapters.
    pub async fn health(&self) -> HealthStatus {
        let mut reasons = Vec::new();
        let mut any_unhealthy = false;
        for platform in self.platforms() {
            let Some(channel) = self.connected.get(&platform) else {
                continue;
            };
            match channel.health_check().await {
                Ok(HealthStatus::Healthy) => {}
                Ok(HealthStatus::Degraded(reason)) => reasons.push(format!("{platform}: {reason}")),
                Ok(HealthStatus::Unhealthy(reason)) => {
                    any_unhealthy = true;
                    reasons.push(format!("{platform}: {reason}"));
                }
                Err(e) => {
                    any_unhealthy = true;
                    reasons.push(format!("{platform}: {e}"));
                }
            }
        }
        if any_unhealthy && reasons.len() == self.connected.len() {
            HealthStatus::Unhealthy(reasons.join("; "))
        } else if !reasons.is_empty() {
            HealthStatus::Degraded(reasons.join("; "))
        } else {
            HealthStatus::Healthy
        }
    }

    /// Stop the receive tasks and shut every adapter down.
    pub async fn shutdown(&self) {
        if let Ok(mut receivers) = self.receivers.lock() {
            for handle in receivers.drain(..) {
                handle.abort();
            }
        }
        for (platform, channel) in &self.connected {
            if let Err(e) = channel.shutdown().await {
                warn!(platform = %platform, error = %e, "channel shutdown error");
            }
        }
    }
}

async fn forward_inbound(
    platform: String,
    channel: Arc<dyn ChannelAdapter>,
    tx: mpsc::Sender<InboundMessage>,
) {
    loop {
        match channel.receive().await {
            Ok(mut msg) => {
                msg.platform = platform.clone();
                if tx.send(msg).await.is_err() {
                    break;
                }
            }
            Err(e) if e.to_string().contains("closed") => {
                info!(platform = %platform, "channel closed, stopping receive task");
                break;
            }
            Err(e) => {
                warn!(platform = %platform, error = %e, "channel receive error");
                tokio::time::sleep(RECEIVE_ERROR_PAUSE).await;
            }
        }
    }
}

#[async_trait]
impl MessageSink for ChannelRegistry {
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        text: &str,
    ) -> Result<MessageId, YouclawError> {
        self.send(
            &target.platform,
            OutboundMessage {
                channel: target.channel.clone(),
                text: text.to_string(),
                reply_to: None,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use youclaw_core::{AdapterType, ChannelCapabilities, PluginAdapter};

    /// Yields its scripted messages, then reports closed.
    struct Scripted {
        name: &'static str,
        inbound: std::sync::Mutex<Vec<InboundMessage>>,
        sent: Arc<std::sync::Mutex<Vec<OutboundMessage>>>,
    }

    impl Scripted {
        fn new(name: &'static str, texts: &[&str]) -> Self {
            let inbound = texts
                .iter()
                .rev()
                .map(|t| InboundMessage {
                    id: format!("m-{t}"),
                    platform: "unset".into(),
                    user_id: "u1".into(),
                    channel: "c1".into(),
                    text: t.to_string(),
                    timestamp: Utc::now(),
                })
                .collect();
            Self {
                name,
                inbound: std::sync::Mutex::new(inbound),
                sent: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl PluginAdapter for Scripted {
        fn name(&self) -> &str {
            self.name
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Channel
        }
        async fn health_check(&self) -> Result<HealthStatus, YouclawError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), YouclawError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ChannelAdapter for Scripted {
        fn capabilities(&self) -> ChannelCapabilities {
            ChannelCapabilities::default()
        }
        async fn connect(&mut self) -> Result<(), YouclawError> {
            Ok(())
        }
        async fn send(&self, msg: OutboundMessage) -> Result<MessageId, YouclawError> {
            self.sent.lock().unwrap().push(msg);
            Ok(MessageId("sent".into()))
        }
        async fn receive(&self) -> Result<InboundMessage, YouclawError> {
            let next = self.inbound.lock().unwrap().pop();
            next.ok_or_else(|| YouclawError::channel("channel closed"))
        }
    }

    #[tokio::test]
    async fn messages_are_tagged_with_platform_and_stream_ends_when_closed() {
        let mut registry = ChannelRegistry::new();
        registry.add_channel(Box::new(Scripted::new("alpha", &["one", "two"])));
        assert_eq!(registry.channel_count(), 1);
        registry.connect_all().await.unwrap();
        assert_eq!(registry.platforms(), vec!["alpha".to_string()]);

        let first = registry.next_message().await.unwrap();
        let second = registry.next_message().await.unwrap();
        assert_eq!((first.text.as_str(), second.text.as_str()), ("one", "two"));
        assert_eq!(first.platform, "alpha");
        assert!(registry.next_message().await.is_none());
    }

    #[tokio::test]
    async fn deliver_routes_by_platform() {
        let alpha = Scripted::new("alpha", &[]);
        let sent = Arc::clone(&alpha.sent);
        let mut registry = ChannelRegistry::new();
        registry.add_channel(Box::new(alpha));
        registry.add_channel(Box::new(Scripted::new("beta", &[])));
        registry.connect_all().await.unwrap();

        let target = DeliveryTarget {
            platform: "alpha".into(),
            channel: "room-7".into(),
        };
        registry.deliver(&target, "hello").await.unwrap();
        let sent = sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel, "room-7");
        assert_eq!(sent[0].text, "hello");
        assert!(sent[0].reply_to.is_none());
    }

    #[tokio::test]
    async fn unknown_platform_is_a_channel_error() {
        let mut registry = ChannelRegistry::new();
        registry.connect_all().await.unwrap();
        let target = DeliveryTarget {
            platform: "pager".into(),
            channel: "x".into(),
        };
        let err = registry.deliver(&target, "hi").await.unwrap_err();
        assert!(matches!(err, YouclawError::Channel { .. }));
    }

    #[tokio::test]
    async fn second_connect_is_rejected() {
        let mut registry = ChannelRegistry::new();
        registry.connect_all().await.unwrap();
        assert!(matches!(
            registry.connect_all().await,
            Err(YouclawError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn empty_registry_is_healthy() {
        let mut registry = ChannelRegistry::new();
        registry.connect_all().await.unwrap();
        assert_eq!(registry.health().await, HealthStatus::Healthy);
        registry.shutdown().await;
    }
}
