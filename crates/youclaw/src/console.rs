// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Console channel: stdin lines in, stdout replies out.
//!
//! Every line is attributed to one local user. Scheduled deliveries for
//! platform `console` are printed the same way as chat replies.

use async_trait::async_trait;
use chrono::Utc;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use youclaw_core::{
    AdapterType, ChannelAdapter, ChannelCapabilities, HealthStatus, InboundMessage, MessageId,
    OutboundMessage, PluginAdapter, YouclawError,
};

pub const CONSOLE_PLATFORM: &str = "console";

pub struct ConsoleChannel {
    user_id: String,
    assistant_name: String,
    lines: Mutex<Option<Lines<BufReader<Stdin>>>>,
}

impl ConsoleChannel {
    pub fn new(user_id: impl Into<String>, assistant_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            assistant_name: assistant_name.into(),
            lines: Mutex::new(None),
        }
    }

    fn inbound(&self, text: String) -> InboundMessage {
        InboundMessage {
            id: uuid::Uuid::new_v4().to_string(),
            platform: CONSOLE_PLATFORM.to_string(),
            user_id: self.user_id.clone(),
            channel: self.user_id.clone(),
            text,
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
impl PluginAdapter for ConsoleChannel {
    fn name(&self) -> &str {
        CONSOLE_PLATFORM
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, YouclawError> {
        if self.lines.lock().await.is_some() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("console input closed".into()))
        }
    }

    async fn shutdown(&self) -> Result<(), YouclawError> {
        self.lines.lock().await.take();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for ConsoleChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_markdown: false,
            max_message_length: None,
        }
    }

    async fn connect(&mut self) -> Result<(), YouclawError> {
        *self.lines.get_mut() = Some(BufReader::new(tokio::io::stdin()).lines());
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, YouclawError> {
        println!("{} {}", format!("{}>", self.assistant_name).green(), msg.text);
        Ok(MessageId(uuid::Uuid::new_v4().to_string()))
    }

    async fn receive(&self) -> Result<InboundMessage, YouclawError> {
        let mut guard = self.lines.lock().await;
        let Some(lines) = guard.as_mut() else {
            return Err(YouclawError::channel("console input closed"));
        };
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Ok(self.inbound(line)),
                Ok(None) => {
                    guard.take();
                    return Err(YouclawError::channel("console input closed"));
                }
                Err(e) => {
                    return Err(YouclawError::Channel {
                        message: "failed to read console input".into(),
                        source: Some(Box::new(e)),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive_before_connect_reports_closed() {
        let console = ConsoleChannel::new("local", "youclaw");
        let err = console.receive().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
        assert!(matches!(
            console.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[test]
    fn inbound_lines_are_attributed_to_the_local_user() {
        let console = ConsoleChannel::new("local", "youclaw");
        let msg = console.inbound("hello".into());
        assert_eq!(msg.platform, CONSOLE_PLATFORM);
        assert_eq!(msg.user_id, "local");
        assert_eq!(msg.channel, "local");
        assert_eq!(msg.text, "hello");
    }
}
