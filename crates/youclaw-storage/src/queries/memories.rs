// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory entry queries. Every read is scoped to a single `user_id`.

use rusqlite::{OptionalExtension, params};
use youclaw_core::YouclawError;

use crate::database::{Database, map_tr_err};
use crate::models::{MemoryCounts, MemoryRow, NewMemoryRow};

const MEMORY_COLUMNS: &str =
    "rowid, id, user_id, text, embedding, dimensions, source, platform, role, created_at";

fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemoryRow> {
    Ok(MemoryRow {
        seq: row.get(0)?,
        id: row.get(1)?,
        user_id: row.get(2)?,
        text: row.get(3)?,
        embedding: row.get(4)?,
        dimensions: row.get(5)?,
        source: row.get(6)?,
        platform: row.get(7)?,
        role: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Insert a memory entry, returning its rowid.
pub async fn insert_memory(db: &Database, entry: NewMemoryRow) -> Result<i64, YouclawError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO memories (id, user_id, text, embedding, dimensions, source, platform, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.id,
                    entry.user_id,
                    entry.text,
                    entry.embedding,
                    entry.dimensions,
                    entry.source,
                    entry.platform,
                    entry.role,
                    entry.created_at,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Insert several entries in one transaction, returning their rowids in order.
/// Either every entry is stored or none is.
pub async fn insert_memories(
    db: &Database,
    entries: Vec<NewMemoryRow>,
) -> Result<Vec<i64>, YouclawError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut seqs = Vec::with_capacity(entries.len());
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO memories (id, user_id, text, embedding, dimensions, source, platform, role, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                )?;
                for entry in &entries {
                    stmt.execute(params![
                        entry.id,
                        entry.user_id,
                        entry.text,
                        entry.embedding,
                        entry.dimensions,
                        entry.source,
                        entry.platform,
                        entry.role,
                        entry.created_at,
                    ])?;
                    seqs.push(tx.last_insert_rowid());
                }
            }
            tx.commit()?;
            Ok(seqs)
        })
        .await
        .map_err(map_tr_err)
}

/// Newest `created_at` ever written for a user, tombstoned entries included.
pub async fn latest_created_at(
    db: &Database,
    user_id: &str,
) -> Result<Option<String>, YouclawError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let latest: Option<String> = conn.query_row(
                "SELECT MAX(created_at) FROM memories WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?;
            Ok(latest)
        })
        .await
        .map_err(map_tr_err)
}

/// All live entries of one user with the given vector dimension.
pub async fn live_memories_for_user(
    db: &Database,
    user_id: &str,
    dimensions: usize,
) -> Result<Vec<MemoryRow>, YouclawError> {
    let user_id = user_id.to_string();
    let dimensions = dimensions as i64;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MEMORY_COLUMNS} FROM memories
                 WHERE user_id = ?1 AND dimensions = ?2 AND deleted_at IS NULL"
            ))?;
            let rows = stmt
                .query_map(params![user_id, dimensions], row_to_memory)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent live entries of one user, newest first.
pub async fn recent_memories(
    db: &Database,
    user_id: &str,
    limit: usize,
) -> Result<Vec<MemoryRow>, YouclawError> {
    let user_id = user_id.to_string();
    let limit = limit as i64;
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MEMORY_COLUMNS} FROM memories
                 WHERE user_id = ?1 AND deleted_at IS NULL
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![user_id, limit], row_to_memory)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a live entry by id, only if it belongs to `user_id`.
pub async fn get_memory(
    db: &Database,
    id: &str,
    user_id: &str,
) -> Result<Option<MemoryRow>, YouclawError> {
    let id = id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT {MEMORY_COLUMNS} FROM memories
                         WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL"
                    ),
                    params![id, user_id],
                    row_to_memory,
                )
                .optional()?;
            Ok(row)
        })
        .await
        .map_err(map_tr_err)
}

/// Tombstone one live entry owned by `user_id`. Returns false if nothing matched.
pub async fn tombstone_memory(
    db: &Database,
    id: &str,
    user_id: &str,
    deleted_at: &str,
) -> Result<bool, YouclawError> {
    let id = id.to_string();
    let user_id = user_id.to_string();
    let deleted_at = deleted_at.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE memories SET deleted_at = ?3
                 WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL",
                params![id, user_id, deleted_at],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Tombstone every live entry owned by `user_id`, returning how many were affected.
pub async fn tombstone_all_for_user(
    db: &Database,
    user_id: &str,
    deleted_at: &str,
) -> Result<usize, YouclawError> {
    let user_id = user_id.to_string();
    let deleted_at = deleted_at.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE memories SET deleted_at = ?2 WHERE user_id = ?1 AND deleted_at IS NULL",
                params![user_id, deleted_at],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}

/// Counts over all live entries.
pub async fn memory_counts(db: &Database) -> Result<MemoryCounts, YouclawError> {
    db.connection()
        .call(|conn| {
            let counts = conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT user_id) FROM memories WHERE deleted_at IS NULL",
                [],
                |row| {
                    let total: i64 = row.get(0)?;
                    let users: i64 = row.get(1)?;
                    Ok(MemoryCounts {
                        total_entries: total as u64,
                        unique_users: users as u64,
                    })
                },
            )?;
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of live entries for one user.
pub async fn count_for_user(db: &Database, user_id: &str) -> Result<u64, YouclawError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM memories WHERE user_id = ?1 AND deleted_at IS NULL",
                params![user_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
        .map_err(map_tr_err)
}
