// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The message router: one inbound chat message in, one reply out.
//!
//! A reply is produced under the sender's inference lane: memory is
//! recalled, the model is asked, and the exchange is persisted before the
//! lane is released. Two messages from the same user therefore land in
//! memory in the order their completions ran, and each one sees the
//! exchange before it.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use youclaw_config::model::YouclawConfig;
use youclaw_context::{ContextBuilder, SystemPrompt, render_chat_prompt};
use youclaw_core::{HealthStatus, ProviderRequest, YouclawError, model_matches};
use youclaw_memory::MemoryStore;
use youclaw_resilience::InferenceDispatcher;

use crate::commands::{self, Command};

/// Router knobs, usually taken from `[agent]`, `[ollama]` and `[memory]`.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    /// Deadline for waiting on the user's lane plus the completion.
    pub reply_timeout: Duration,
    pub context_budget_chars: usize,
    pub command_prefix: String,
    pub assistant_name: String,
    /// Configured chat model, answering until someone switches.
    pub model_name: String,
}

impl RouterSettings {
    pub fn from_config(config: &YouclawConfig) -> Self {
        Self {
            reply_timeout: config.agent.reply_timeout(),
            context_budget_chars: config.memory.context_budget_chars,
            command_prefix: config.agent.command_prefix.clone(),
            assistant_name: config.agent.name.clone(),
            model_name: config.ollama.chat_model.clone(),
        }
    }
}

pub struct MessageRouter {
    dispatcher: Arc<InferenceDispatcher>,
    context: ContextBuilder,
    system_prompt: SystemPrompt,
    settings: RouterSettings,
}

impl MessageRouter {
    pub fn new(
        dispatcher: Arc<InferenceDispatcher>,
        context: ContextBuilder,
        system_prompt: SystemPrompt,
        settings: RouterSettings,
    ) -> Self {
        Self {
            dispatcher,
            context,
            system_prompt,
            settings,
        }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    fn memory(&self) -> &MemoryStore {
        self.context.memory()
    }

    /// Produce the reply for one message. Failures become a short
    /// user-facing apology; the detail is logged.
    pub async fn handle(&self, platform: &str, user_id: &str, text: &str) -> String {
        match self.try_handle(platform, user_id, text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(platform, user_id, error = %e, "message handling failed");
                e.user_message().to_string()
            }
        }
    }

    /// Like [`handle`](Self::handle) but returns the error instead of
    /// apologising. The message and its reply are remembered together or
    /// not at all; nothing is written unless the completion succeeded.
    pub async fn try_handle(
        &self,
        platform: &str,
        user_id: &str,
        text: &str,
    ) -> Result<String, YouclawError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(YouclawError::InvalidInput("message text is empty".into()));
        }
        if user_id.trim().is_empty() {
            return Err(YouclawError::InvalidInput("user id is empty".into()));
        }
        if let Some(command) = commands::parse_command(text, &self.settings.command_prefix) {
            return self.run_command(command, user_id).await;
        }

        let started = Instant::now();
        let lane = self
            .dispatcher
            .acquire(user_id, self.settings.reply_timeout)
            .await?;

        let context = self
            .context
            .build(user_id, text, platform, self.settings.context_budget_chars)
            .await?;
        debug!(
            user_id,
            recalled = context.len(),
            used_chars = context.used_chars,
            "memory recalled"
        );

        let prompt = render_chat_prompt(&context, text);
        let request = ProviderRequest::new(prompt).with_system_prompt(self.system_prompt.as_str());
        let reply = lane.complete(request).await?;

        if reply.trim().is_empty() {
            return Err(YouclawError::inference("model returned an empty reply"));
        }

        self.memory()
            .write_exchange(user_id, text, &reply, Some(platform))
            .await?;
        drop(lane);

        info!(
            platform,
            user_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reply ready"
        );
        Ok(reply)
    }

    async fn run_command(&self, command: Command, user_id: &str) -> Result<String, YouclawError> {
        let prefix = &self.settings.command_prefix;
        debug!(user_id, ?command, "chat command");
        match command {
            Command::Help => Ok(commands::help_text(prefix, &self.settings.assistant_name)),
            Command::Reset => {
                let forgotten = self.memory().clear_user(user_id).await?;
                info!(user_id, forgotten, "memory reset by user");
                Ok(format!("Done. I forgot {forgotten} memories."))
            }
            Command::Stats => {
                let stats = self.memory().stats().await?;
                let yours = self.memory().count(user_id).await?;
                let inference = self.dispatcher.health().await;
                let embeddings = self.memory().embedding_health().await;
                Ok(format!(
                    "Memory: {yours} entries for you, {} entries across {} users.\n\
                     Inference ({}): {}\n\
                     Embeddings: {}",
                    stats.total_entries,
                    stats.unique_users,
                    self.dispatcher.provider_name(),
                    describe_health(&inference),
                    describe_health(&embeddings),
                ))
            }
            Command::Model(None) => Ok(format!(
                "Chat model: {} (via {}).",
                self.current_model(),
                self.dispatcher.provider_name()
            )),
            Command::Model(Some(name)) => self.switch_model(user_id, &name).await,
            Command::Models => {
                let installed = self.dispatcher.list_models().await?;
                if installed.is_empty() {
                    return Ok("No models are installed.".to_string());
                }
                let current = self.current_model();
                let lines: Vec<String> = installed
                    .iter()
                    .map(|m| {
                        let marker = if model_matches(m, &current) { "*" } else { "-" };
                        format!("{marker} {m}")
                    })
                    .collect();
                Ok(format!("Installed models:\n{}", lines.join("\n")))
            }
            Command::Unknown(name) => Ok(commands::unknown_text(prefix, &name)),
        }
    }

    /// The model answering right now: the switched-to one, else the configured one.
    fn current_model(&self) -> String {
        self.dispatcher
            .active_model()
            .unwrap_or_else(|| self.settings.model_name.clone())
    }

    /// Switch the chat model for everyone, refusing names the provider does
    /// not have installed. Providers that cannot list models accept any name.
    async fn switch_model(&self, user_id: &str, name: &str) -> Result<String, YouclawError> {
        let prefix = &self.settings.command_prefix;
        let installed = self.dispatcher.list_models().await?;
        if !installed.is_empty() && !installed.iter().any(|m| model_matches(m, name)) {
            return Ok(format!(
                "Model `{name}` is not installed. Type `{prefix}models` to see what is."
            ));
        }
        let model = (name != self.settings.model_name).then(|| name.to_string());
        self.dispatcher.set_active_model(model);
        info!(user_id, model = name, "chat model switched");
        Ok(format!("Switched to {name}."))
    }
}

fn describe_health(status: &HealthStatus) -> String {
    match status {
        HealthStatus::Healthy => "ok".to_string(),
        HealthStatus::Degraded(reason) => format!("degraded ({reason})"),
        HealthStatus::Unhealthy(reason) => format!("down ({reason})"),
    }
}
