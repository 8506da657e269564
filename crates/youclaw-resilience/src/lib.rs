// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for the YouClaw assistant runtime.
//!
//! - [`UserLanes`]: one-permit semaphore per user, released on guard drop
//! - [`RetryPolicy`]: bounded exponential backoff for transient failures
//! - [`InferenceDispatcher`]: per-user serialized, deadline-bounded completions

pub mod dispatcher;
pub mod lanes;
pub mod retry;

pub use dispatcher::{InferenceDispatcher, InferenceLane};
pub use lanes::{UserLaneGuard, UserLanes};
pub use retry::RetryPolicy;
