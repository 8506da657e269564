// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types mirroring the SQLite schema.
//!
//! Timestamps are RFC 3339 strings with millisecond precision and a `Z`
//! suffix, so lexical order equals chronological order.

use chrono::{DateTime, SubsecRound, Utc};
use youclaw_core::YouclawError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Render a timestamp in the stored text format, truncated to milliseconds.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.trunc_subsecs(3).format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, YouclawError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| YouclawError::Internal(format!("corrupt timestamp {raw:?}: {e}")))
}

/// A persisted memory entry as stored in the `memories` table.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRow {
    /// SQLite rowid; strictly increasing in insertion order.
    pub seq: i64,
    pub id: String,
    pub user_id: String,
    pub text: String,
    /// Little-endian f32 vector.
    pub embedding: Vec<u8>,
    pub dimensions: i64,
    pub source: String,
    pub platform: Option<String>,
    pub role: Option<String>,
    pub created_at: String,
}

/// A memory entry about to be inserted.
#[derive(Debug, Clone)]
pub struct NewMemoryRow {
    pub id: String,
    pub user_id: String,
    pub text: String,
    pub embedding: Vec<u8>,
    pub dimensions: i64,
    pub source: String,
    pub platform: Option<String>,
    pub role: Option<String>,
    pub created_at: String,
}

/// Aggregate counts over live memory entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryCounts {
    pub total_entries: u64,
    pub unique_users: u64,
}

/// A persisted scheduled task as stored in the `scheduled_tasks` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: String,
    pub user_id: String,
    pub schedule: String,
    pub prompt_template: String,
    pub delivery_platform: String,
    pub delivery_channel: String,
    pub enabled: bool,
    pub last_run_at: Option<String>,
    pub next_run_at: String,
    pub created_at: String,
}
