// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled task records and their conversions to storage rows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use youclaw_core::{DeliveryTarget, YouclawError};
use youclaw_storage::{TaskRow, format_timestamp, parse_timestamp};

use crate::schedule::Schedule;

/// A recurring AI job owned by one user.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub id: String,
    pub user_id: String,
    pub schedule: Schedule,
    /// Instruction text; may contain `{user_id}`, `{date}`, `{time}`, `{memory}`.
    pub prompt_template: String,
    pub delivery_target: DeliveryTarget,
    pub enabled: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ScheduledTask {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run_at <= now
    }

    pub(crate) fn to_row(&self) -> TaskRow {
        TaskRow {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            schedule: self.schedule.as_str().to_string(),
            prompt_template: self.prompt_template.clone(),
            delivery_platform: self.delivery_target.platform.clone(),
            delivery_channel: self.delivery_target.channel.clone(),
            enabled: self.enabled,
            last_run_at: self.last_run_at.map(format_timestamp),
            next_run_at: format_timestamp(self.next_run_at),
            created_at: format_timestamp(self.created_at),
        }
    }

    pub(crate) fn from_row(row: TaskRow) -> Result<Self, YouclawError> {
        Ok(Self {
            schedule: Schedule::parse(&row.schedule)?,
            last_run_at: row.last_run_at.as_deref().map(parse_timestamp).transpose()?,
            next_run_at: parse_timestamp(&row.next_run_at)?,
            created_at: parse_timestamp(&row.created_at)?,
            delivery_target: DeliveryTarget {
                platform: row.delivery_platform,
                channel: row.delivery_channel,
            },
            id: row.id,
            user_id: row.user_id,
            prompt_template: row.prompt_template,
            enabled: row.enabled,
        })
    }
}

/// Parameters for creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: String,
    pub schedule: String,
    pub prompt_template: String,
    pub delivery_target: DeliveryTarget,
}

/// Partial edit of a task; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub schedule: Option<String>,
    pub prompt_template: Option<String>,
    pub delivery_target: Option<DeliveryTarget>,
    pub enabled: Option<bool>,
}

/// Observable execution state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskRunState {
    /// Waiting for its next occurrence.
    Idle,
    /// Selected by the tick loop, waiting for a worker or the user's lane.
    Due,
    Running,
    /// The last run failed; the task waits for its next natural occurrence.
    Failed,
}

/// Result of one fire attempt.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task_id: String,
    pub user_id: String,
    pub fired_at: DateTime<Utc>,
    pub next_run_at: DateTime<Utc>,
    /// Generated text on success, error description on failure.
    pub result: Result<String, String>,
    /// Whether the text reached its delivery target.
    pub delivered: bool,
}

impl TaskOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}
