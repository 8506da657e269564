// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery sink that records what the scheduler delivered.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use youclaw_core::{DeliveryTarget, MessageId, MessageSink, YouclawError};

#[derive(Default)]
pub struct MockSink {
    delivered: Mutex<Vec<(DeliveryTarget, String)>>,
    failing: AtomicBool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every delivery fails as if the platform were down.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn delivered(&self) -> Vec<(DeliveryTarget, String)> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().map(|d| d.len()).unwrap_or_default()
    }
}

#[async_trait]
impl MessageSink for MockSink {
    async fn deliver(
        &self,
        target: &DeliveryTarget,
        text: &str,
    ) -> Result<MessageId, YouclawError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(YouclawError::channel(format!("{} is down", target.platform)));
        }
        let mut delivered = self
            .delivered
            .lock()
            .map_err(|_| YouclawError::Internal("mock sink poisoned".into()))?;
        delivered.push((target.clone(), text.to_string()));
        Ok(MessageId(format!("delivery-{}", delivered.len())))
    }
}
