// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled AI tasks for the YouClaw assistant runtime.
//!
//! A task pairs a schedule (cron expression or human-readable interval) with
//! a prompt template and a delivery target. When due, the scheduler asks the
//! model under the owner's inference lane, stores the result in memory, then
//! delivers it. Failed runs wait for their next natural occurrence.

pub mod schedule;
pub mod scheduler;
pub mod task;

pub use schedule::Schedule;
pub use scheduler::{DELIVERY_HEADER, SchedulerSettings, TaskScheduler};
pub use task::{NewTask, ScheduledTask, TaskOutcome, TaskRunState, TaskUpdate};
