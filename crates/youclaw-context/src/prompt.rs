// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt rendering for chat replies and scheduled tasks.

use chrono::{DateTime, Utc};
use youclaw_config::model::AgentConfig;
use youclaw_core::{MemorySource, Role};
use youclaw_memory::MemoryEntry;

use crate::builder::ConversationContext;

const MEMORY_HEADER: &str = "### RELEVANT MEMORY ###";
const MEMORY_FOOTER: &str = "### END MEMORY ###";

/// The system prompt sent with every completion.
#[derive(Debug, Clone)]
pub struct SystemPrompt {
    text: String,
}

impl SystemPrompt {
    /// Inline `agent.system_prompt` when set and non-blank, otherwise a
    /// default naming the assistant.
    pub fn from_config(config: &AgentConfig) -> Self {
        let text = match config.system_prompt.as_deref().map(str::trim) {
            Some(prompt) if !prompt.is_empty() => prompt.to_string(),
            _ => format!(
                "You are {}, a concise personal assistant. Use the relevant memory \
                 provided with a message when it helps, and never invent memories.",
                config.name
            ),
        };
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

fn speaker(entry: &MemoryEntry) -> &'static str {
    match (entry.role, entry.source) {
        (Some(Role::User), _) => "USER",
        (Some(Role::Assistant), _) => "ASSISTANT",
        (None, MemorySource::ScheduledTask) => "SCHEDULED",
        (None, _) => "NOTE",
    }
}

/// Render memory entries as a delimited block, one line per entry.
///
/// Returns an empty string when the context holds no entries.
pub fn render_memory_block(context: &ConversationContext) -> String {
    if context.is_empty() {
        return String::new();
    }
    let mut out = String::from(MEMORY_HEADER);
    for scored in &context.entries {
        let entry = &scored.entry;
        out.push('\n');
        out.push_str(&format!(
            "[{}] {}: {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            speaker(entry),
            entry.text
        ));
    }
    out.push('\n');
    out.push_str(MEMORY_FOOTER);
    out
}

/// The user-turn prompt: relevant memory (if any) followed by the message.
pub fn render_chat_prompt(context: &ConversationContext, incoming_text: &str) -> String {
    let block = render_memory_block(context);
    if block.is_empty() {
        incoming_text.to_string()
    } else {
        format!("{block}\n\n{incoming_text}")
    }
}

/// Interpolate `{user_id}`, `{date}`, `{time}` and `{memory}` in a task template.
///
/// Unknown braces are left as they are.
pub fn render_template(
    template: &str,
    user_id: &str,
    now: DateTime<Utc>,
    context: &ConversationContext,
) -> String {
    template
        .replace("{user_id}", user_id)
        .replace("{date}", &now.format("%Y-%m-%d").to_string())
        .replace("{time}", &now.format("%H:%M UTC").to_string())
        .replace("{memory}", &render_memory_block(context))
}

/// Wrap a rendered task instruction in the briefing sent to the model.
///
/// The memory block is appended only when the template did not place it
/// itself through `{memory}`.
pub fn render_mission_briefing(
    template: &str,
    user_id: &str,
    now: DateTime<Utc>,
    context: &ConversationContext,
) -> String {
    let instruction = render_template(template, user_id, now, context);
    let mut out = format!(
        "### MISSION BRIEFING ###\n{instruction}\n\n\
         ### DIRECTIVES ###\n\
         1. This is a scheduled task; the user is not waiting on a live reply.\n\
         2. Do not repeat earlier updates word for word; find a fresh angle.\n\
         3. Current time is {}.",
        now.format("%Y-%m-%d %H:%M UTC")
    );
    if !template.contains("{memory}") {
        let block = render_memory_block(context);
        if !block.is_empty() {
            out.push_str("\n\n");
            out.push_str(&block);
        }
    }
    out
}
