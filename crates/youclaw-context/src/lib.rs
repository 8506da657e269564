// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation context for YouClaw prompt assembly.
//!
//! - **Builder**: selects the user's most relevant memories for one request,
//!   greedily, under a character budget
//! - **Prompt**: system prompt loading, chat prompt rendering, scheduled-task
//!   template interpolation and mission briefings

pub mod builder;
pub mod prompt;

pub use builder::{ContextBuilder, ConversationContext, fit_to_budget};
pub use prompt::{
    SystemPrompt, render_chat_prompt, render_memory_block, render_mission_briefing, render_template,
};
