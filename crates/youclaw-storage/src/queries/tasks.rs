// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled task CRUD operations.

use rusqlite::{OptionalExtension, params};
use youclaw_core::YouclawError;

use crate::database::{Database, map_tr_err};
use crate::models::TaskRow;

const TASK_COLUMNS: &str = "id, user_id, schedule, prompt_template, delivery_platform, \
     delivery_channel, enabled, last_run_at, next_run_at, created_at";

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        schedule: row.get(2)?,
        prompt_template: row.get(3)?,
        delivery_platform: row.get(4)?,
        delivery_channel: row.get(5)?,
        enabled: row.get(6)?,
        last_run_at: row.get(7)?,
        next_run_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Insert a new task.
pub async fn insert_task(db: &Database, task: &TaskRow) -> Result<(), YouclawError> {
    let task = task.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scheduled_tasks (id, user_id, schedule, prompt_template, delivery_platform,
                 delivery_channel, enabled, last_run_at, next_run_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    task.id,
                    task.user_id,
                    task.schedule,
                    task.prompt_template,
                    task.delivery_platform,
                    task.delivery_channel,
                    task.enabled,
                    task.last_run_at,
                    task.next_run_at,
                    task.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a task by id.
pub async fn get_task(db: &Database, id: &str) -> Result<Option<TaskRow>, YouclawError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let task = conn
                .query_row(
                    &format!("SELECT {TASK_COLUMNS} FROM scheduled_tasks WHERE id = ?1"),
                    params![id],
                    row_to_task,
                )
                .optional()?;
            Ok(task)
        })
        .await
        .map_err(map_tr_err)
}

/// List tasks, optionally restricted to one user, oldest first.
pub async fn list_tasks(
    db: &Database,
    user_id: Option<&str>,
) -> Result<Vec<TaskRow>, YouclawError> {
    let user_id = user_id.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM scheduled_tasks
                 WHERE (?1 IS NULL OR user_id = ?1)
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let tasks = stmt
                .query_map(params![user_id], row_to_task)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
        .await
        .map_err(map_tr_err)
}

/// Replace the user-editable fields of a task owned by `task.user_id`.
///
/// Returns false if no such task exists for that user.
pub async fn update_task(db: &Database, task: &TaskRow) -> Result<bool, YouclawError> {
    let task = task.clone();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE scheduled_tasks SET schedule = ?3, prompt_template = ?4,
                 delivery_platform = ?5, delivery_channel = ?6, enabled = ?7, next_run_at = ?8
                 WHERE id = ?1 AND user_id = ?2",
                params![
                    task.id,
                    task.user_id,
                    task.schedule,
                    task.prompt_template,
                    task.delivery_platform,
                    task.delivery_channel,
                    task.enabled,
                    task.next_run_at,
                ],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Bookkeeping written after a task fires.
#[derive(Debug, Clone, Copy)]
pub struct RunRecord<'a> {
    pub id: &'a str,
    /// Schedule the next run was computed from.
    pub schedule: &'a str,
    /// `None` keeps the stored value (used after a failed fire).
    pub last_run_at: Option<&'a str>,
    pub next_run_at: &'a str,
    /// The schedule has no further occurrence; the task is disabled.
    pub exhausted: bool,
}

/// Advance a task's run bookkeeping in one statement.
///
/// `next_run_at` and the exhausted flag only apply while the stored schedule
/// still equals `record.schedule`; an edit made during the run keeps its own
/// `next_run_at`. Returns false if the task no longer exists.
pub async fn record_run(db: &Database, record: &RunRecord<'_>) -> Result<bool, YouclawError> {
    let id = record.id.to_string();
    let schedule = record.schedule.to_string();
    let last_run_at = record.last_run_at.map(str::to_string);
    let next_run_at = record.next_run_at.to_string();
    let exhausted = record.exhausted;
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE scheduled_tasks
                 SET last_run_at = COALESCE(?2, last_run_at),
                     next_run_at = CASE WHEN schedule = ?4 THEN ?3 ELSE next_run_at END,
                     enabled = CASE WHEN schedule = ?4 AND ?5 THEN 0 ELSE enabled END
                 WHERE id = ?1",
                params![id, last_run_at, next_run_at, schedule, exhausted],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a task owned by `user_id`. Returns false if nothing matched.
pub async fn delete_task(db: &Database, id: &str, user_id: &str) -> Result<bool, YouclawError> {
    let id = id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "DELETE FROM scheduled_tasks WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
