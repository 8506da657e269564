// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user lanes.
//!
//! Each user gets a semaphore with a single permit. Holding the permit means
//! "this user has an inference in flight"; further callers for the same user
//! queue in FIFO order while other users proceed independently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};
use youclaw_core::YouclawError;

/// Lane holds longer than this are logged as suspicious.
const LANE_HOLD_WARNING: Duration = Duration::from_secs(300);

/// Guard for a user's lane. The permit is returned exactly once, when this drops.
pub struct UserLaneGuard {
    user_id: String,
    acquired_at: Instant,
    _permit: OwnedSemaphorePermit,
}

impl UserLaneGuard {
    /// The user this lane belongs to.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// How long the lane has been held.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

impl Drop for UserLaneGuard {
    fn drop(&mut self) {
        let held = self.held_for();
        if held > LANE_HOLD_WARNING {
            warn!(user_id = %self.user_id, held_ms = held.as_millis() as u64, "user lane held unusually long");
        } else {
            debug!(user_id = %self.user_id, held_ms = held.as_millis() as u64, "user lane released");
        }
    }
}

/// Registry of per-user lanes.
#[derive(Default)]
pub struct UserLanes {
    lanes: DashMap<String, Arc<Semaphore>>,
}

impl UserLanes {
    pub fn new() -> Self {
        Self::default()
    }

    fn lane(&self, user_id: &str) -> Arc<Semaphore> {
        self.lanes
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone()
    }

    /// Wait for the user's lane. Cancel-safe: dropping the future while it
    /// waits leaves the lane untouched.
    pub async fn acquire(&self, user_id: &str) -> Result<UserLaneGuard, YouclawError> {
        let permit = self
            .lane(user_id)
            .acquire_owned()
            .await
            .map_err(|_| YouclawError::Internal(format!("lane for user {user_id} was closed")))?;
        Ok(UserLaneGuard {
            user_id: user_id.to_string(),
            acquired_at: Instant::now(),
            _permit: permit,
        })
    }

    /// Whether a guard for `user_id` is currently alive.
    pub fn is_busy(&self, user_id: &str) -> bool {
        self.lanes
            .get(user_id)
            .is_some_and(|lane| lane.available_permits() == 0)
    }

    /// Number of users with a lane entry.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Drop lanes nobody holds or waits on. Returns how many were removed.
    pub fn prune_idle(&self) -> usize {
        let before = self.lanes.len();
        self.lanes
            .retain(|_, lane| Arc::strong_count(lane) > 1 || lane.available_permits() == 0);
        before.saturating_sub(self.lanes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guard_release_frees_lane() {
        let lanes = UserLanes::new();
        let guard = lanes.acquire("alice").await.unwrap();
        assert!(lanes.is_busy("alice"));
        assert!(!lanes.is_busy("bob"));
        assert_eq!(guard.user_id(), "alice");
        drop(guard);
        assert!(!lanes.is_busy("alice"));
    }

    #[tokio::test]
    async fn second_acquire_waits_for_first() {
        let lanes = Arc::new(UserLanes::new());
        let first = lanes.acquire("alice").await.unwrap();

        let waiter = {
            let lanes = lanes.clone();
            tokio::spawn(async move { lanes.acquire("alice").await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let lanes = UserLanes::new();
        let _a = lanes.acquire("alice").await.unwrap();
        let _b = lanes.acquire("bob").await.unwrap();
        assert_eq!(lanes.len(), 2);
    }

    #[tokio::test]
    async fn prune_keeps_held_lanes() {
        let lanes = UserLanes::new();
        let held = lanes.acquire("alice").await.unwrap();
        drop(lanes.acquire("bob").await.unwrap());

        assert_eq!(lanes.prune_idle(), 1);
        assert!(lanes.is_busy("alice"));
        drop(held);
        assert_eq!(lanes.prune_idle(), 1);
        assert!(lanes.is_empty());
    }
}
