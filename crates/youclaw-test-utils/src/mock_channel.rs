// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for integration testing.
//!
//! `MockChannel` implements `ChannelAdapter` with message injection for
//! inbound testing and capture for outbound verification. Clones share the
//! same queues, so a test can keep a handle after boxing one into a
//! registry.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify};
use youclaw_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, HealthStatus, InboundMessage, MessageId,
    OutboundMessage, PluginAdapter, YouclawError,
};

#[derive(Clone)]
pub struct MockChannel {
    platform: String,
    inbound: Arc<Mutex<VecDeque<InboundMessage>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    notify: Arc<Notify>,
    sent_notify: Arc<Notify>,
    closed: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
}

impl MockChannel {
    /// A channel registered as platform `mock`.
    pub fn new() -> Self {
        Self::named("mock")
    }

    pub fn named(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            sent_notify: Arc::new(Notify::new()),
            closed: Arc::new(AtomicBool::new(false)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Queue a message for `receive()`.
    pub async fn inject_message(&self, msg: InboundMessage) {
        self.inbound.lock().await.push_back(msg);
        self.notify.notify_one();
    }

    /// Queue a text message from `user_id`, using the user id as channel.
    pub async fn inject_text(&self, user_id: &str, text: &str) {
        self.inject_message(InboundMessage {
            id: format!("mock-in-{}", uuid::Uuid::new_v4()),
            platform: self.platform.clone(),
            user_id: user_id.to_string(),
            channel: user_id.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
        })
        .await;
    }

    /// After this, `receive()` drains what is queued and then reports the
    /// channel closed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// While set, `send()` fails with a channel error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Wait until at least `count` messages were sent, or `timeout` passes.
    pub async fn wait_for_sent(&self, count: usize, timeout: Duration) -> Vec<OutboundMessage> {
        let wait = async {
            loop {
                let notified = self.sent_notify.notified();
                {
                    let sent = self.sent.lock().await;
                    if sent.len() >= count {
                        return sent.clone();
                    }
                }
                notified.await;
            }
        };
        match tokio::time::timeout(timeout, wait).await {
            Ok(sent) => sent,
            Err(_) => self.sent_messages().await,
        }
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        &self.platform
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, YouclawError> {
        if self.failing.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("mock channel failing".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), YouclawError> {
        self.close();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_markdown: true,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), YouclawError> {
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, YouclawError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(YouclawError::channel(format!(
                "{} is unreachable",
                self.platform
            )));
        }
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        self.sent_notify.notify_waiters();
        Ok(MessageId(id))
    }

    async fn receive(&self) -> Result<InboundMessage, YouclawError> {
        loop {
            let notified = self.notify.notified();
            {
                let mut queue = self.inbound.lock().await;
                if let Some(msg) = queue.pop_front() {
                    return Ok(msg);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(YouclawError::channel("mock channel closed"));
            }
            notified.await;
        }
    }
}
