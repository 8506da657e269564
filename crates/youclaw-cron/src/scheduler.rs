// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The task scheduler: an owned in-memory index of tasks mirrored to SQLite,
//! and a tick loop that fires due tasks.
//!
//! Every mutation writes storage first and the index second, so the index
//! never holds state that a restart would lose.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use youclaw_config::model::{MemoryConfig, SchedulerConfig};
use youclaw_context::{ContextBuilder, ConversationContext, SystemPrompt};
use youclaw_core::{MemorySource, MessageSink, ProviderRequest, YouclawError};
use youclaw_memory::NewMemory;
use youclaw_memory::store::Clock;
use youclaw_resilience::InferenceDispatcher;
use youclaw_storage::Database;
use youclaw_storage::format_timestamp;
use youclaw_storage::queries::tasks as queries;

use crate::schedule::Schedule;
use crate::task::{NewTask, ScheduledTask, TaskOutcome, TaskRunState, TaskUpdate};

/// Header prepended to every delivered scheduled result.
pub const DELIVERY_HEADER: &str = "**Scheduled update**";

/// Runtime knobs, usually taken from `[scheduler]` and `[memory]`.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub tick_interval: Duration,
    /// Deadline for acquiring the user's lane plus the completion.
    pub task_timeout: Duration,
    pub max_concurrent_tasks: usize,
    pub include_memory: bool,
    pub context_budget_chars: usize,
}

impl SchedulerSettings {
    pub fn from_config(scheduler: &SchedulerConfig, memory: &MemoryConfig) -> Self {
        Self {
            tick_interval: scheduler.tick_interval(),
            task_timeout: scheduler.task_timeout(),
            max_concurrent_tasks: scheduler.max_concurrent_tasks,
            include_memory: scheduler.include_memory,
            context_budget_chars: memory.context_budget_chars,
        }
    }
}

struct TaskSlot {
    task: ScheduledTask,
    state: TaskRunState,
}

/// Owns the scheduled-task set and fires due tasks.
pub struct TaskScheduler {
    db: Database,
    dispatcher: Arc<InferenceDispatcher>,
    context: ContextBuilder,
    sink: Arc<dyn MessageSink>,
    system_prompt: SystemPrompt,
    settings: SchedulerSettings,
    tasks: DashMap<String, TaskSlot>,
    workers: Arc<Semaphore>,
    clock: Clock,
}

fn not_found(id: &str) -> YouclawError {
    YouclawError::NotFound {
        entity: "task",
        id: id.to_string(),
    }
}

impl TaskScheduler {
    pub fn new(
        db: Database,
        dispatcher: Arc<InferenceDispatcher>,
        context: ContextBuilder,
        sink: Arc<dyn MessageSink>,
        system_prompt: SystemPrompt,
        settings: SchedulerSettings,
    ) -> Self {
        let workers = Arc::new(Semaphore::new(settings.max_concurrent_tasks.max(1)));
        Self {
            db,
            dispatcher,
            context,
            sink,
            system_prompt,
            settings,
            tasks: DashMap::new(),
            workers,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock used for due checks and run timestamps.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Rebuild the index from storage.
    ///
    /// Tasks whose `next_run_at` elapsed while the process was down stay due
    /// and fire once on the next tick; missed occurrences are not replayed.
    pub async fn load(&self) -> Result<usize, YouclawError> {
        let rows = queries::list_tasks(&self.db, None).await?;
        let now = self.now();
        let mut overdue = 0usize;
        self.tasks.clear();
        for row in rows {
            let id = row.id.clone();
            let task = match ScheduledTask::from_row(row) {
                Ok(task) => task,
                Err(e) => {
                    error!(task_id = %id, error = %e, "skipping unreadable scheduled task");
                    continue;
                }
            };
            if task.is_due(now) {
                overdue += 1;
            }
            self.tasks.insert(
                id,
                TaskSlot {
                    task,
                    state: TaskRunState::Idle,
                },
            );
        }
        info!(tasks = self.tasks.len(), overdue, "scheduled tasks loaded");
        Ok(self.tasks.len())
    }

    /// Create and persist a new enabled task, first due at its next occurrence.
    pub async fn create_task(&self, new: NewTask) -> Result<ScheduledTask, YouclawError> {
        if new.user_id.trim().is_empty() {
            return Err(YouclawError::InvalidInput("user_id is empty".into()));
        }
        if new.prompt_template.trim().is_empty() {
            return Err(YouclawError::InvalidInput("prompt template is empty".into()));
        }
        if new.delivery_target.platform.trim().is_empty() {
            return Err(YouclawError::InvalidInput("delivery platform is empty".into()));
        }
        let schedule = Schedule::parse(&new.schedule)?;
        let now = self.now();
        let next_run_at = next_or_invalid(&schedule, now)?;

        let task = ScheduledTask {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            schedule,
            prompt_template: new.prompt_template,
            delivery_target: new.delivery_target,
            enabled: true,
            last_run_at: None,
            next_run_at,
            created_at: now,
        };
        queries::insert_task(&self.db, &task.to_row()).await?;
        self.tasks.insert(
            task.id.clone(),
            TaskSlot {
                task: task.clone(),
                state: TaskRunState::Idle,
            },
        );
        info!(
            task_id = %task.id,
            user_id = %task.user_id,
            schedule = %task.schedule,
            next_run_at = %task.next_run_at,
            "scheduled task created"
        );
        Ok(task)
    }

    pub fn get_task(&self, id: &str) -> Result<ScheduledTask, YouclawError> {
        self.tasks
            .get(id)
            .map(|slot| slot.task.clone())
            .ok_or_else(|| not_found(id))
    }

    /// All tasks, or only those of `user_id`, oldest first.
    pub fn list_tasks(&self, user_id: Option<&str>) -> Vec<ScheduledTask> {
        let mut out: Vec<ScheduledTask> = self
            .tasks
            .iter()
            .filter(|slot| user_id.is_none_or(|u| slot.task.user_id == u))
            .map(|slot| slot.task.clone())
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Apply a partial edit. Changing the schedule, or re-enabling a task,
    /// recomputes `next_run_at` from now.
    pub async fn update_task(
        &self,
        id: &str,
        user_id: &str,
        update: TaskUpdate,
    ) -> Result<ScheduledTask, YouclawError> {
        let mut task = self
            .tasks
            .get(id)
            .filter(|slot| slot.task.user_id == user_id)
            .map(|slot| slot.task.clone())
            .ok_or_else(|| not_found(id))?;

        let now = self.now();
        let mut reschedule = false;
        if let Some(raw) = update.schedule {
            task.schedule = Schedule::parse(&raw)?;
            reschedule = true;
        }
        if let Some(template) = update.prompt_template {
            if template.trim().is_empty() {
                return Err(YouclawError::InvalidInput("prompt template is empty".into()));
            }
            task.prompt_template = template;
        }
        if let Some(target) = update.delivery_target {
            task.delivery_target = target;
        }
        if let Some(enabled) = update.enabled {
            reschedule |= enabled && !task.enabled;
            task.enabled = enabled;
        }
        if reschedule {
            task.next_run_at = next_or_invalid(&task.schedule, now)?;
        }

        if !queries::update_task(&self.db, &task.to_row()).await? {
            return Err(not_found(id));
        }
        // Only the editable fields; a run finishing meanwhile owns `last_run_at`.
        let updated = match self.tasks.get_mut(id) {
            Some(mut slot) => {
                slot.task.schedule = task.schedule;
                slot.task.prompt_template = task.prompt_template;
                slot.task.delivery_target = task.delivery_target;
                slot.task.enabled = task.enabled;
                slot.task.next_run_at = task.next_run_at;
                slot.task.clone()
            }
            None => return Err(not_found(id)),
        };
        info!(task_id = id, user_id, enabled = updated.enabled, "scheduled task updated");
        Ok(updated)
    }

    pub async fn set_enabled(
        &self,
        id: &str,
        user_id: &str,
        enabled: bool,
    ) -> Result<ScheduledTask, YouclawError> {
        self.update_task(
            id,
            user_id,
            TaskUpdate {
                enabled: Some(enabled),
                ..TaskUpdate::default()
            },
        )
        .await
    }

    /// Remove a task. A run already in flight finishes but is not rescheduled.
    pub async fn delete_task(&self, id: &str, user_id: &str) -> Result<(), YouclawError> {
        if !queries::delete_task(&self.db, id, user_id).await? {
            return Err(not_found(id));
        }
        self.tasks.remove(id);
        info!(task_id = id, user_id, "scheduled task deleted");
        Ok(())
    }

    pub fn run_state(&self, id: &str) -> Option<TaskRunState> {
        self.tasks.get(id).map(|slot| slot.state)
    }

    /// Mark and return every enabled task due at `now` that is not already
    /// queued or running.
    fn select_due(&self, now: DateTime<Utc>) -> Vec<ScheduledTask> {
        let mut due: Vec<ScheduledTask> = self
            .tasks
            .iter_mut()
            .filter_map(|mut slot| {
                let busy = matches!(slot.state, TaskRunState::Due | TaskRunState::Running);
                if busy || !slot.task.is_due(now) {
                    return None;
                }
                slot.state = TaskRunState::Due;
                Some(slot.task.clone())
            })
            .collect();
        due.sort_by_key(|t| t.next_run_at);
        due
    }

    /// Fire every task due now and wait for all of them.
    pub async fn run_due(&self) -> Vec<TaskOutcome> {
        let due = self.select_due(self.now());
        if due.is_empty() {
            return Vec::new();
        }
        debug!(count = due.len(), "firing due tasks");
        join_all(due.into_iter().map(|task| self.fire(task))).await
    }

    fn set_state(&self, id: &str, state: TaskRunState) {
        if let Some(mut slot) = self.tasks.get_mut(id) {
            slot.state = state;
        }
    }

    async fn fire(&self, task: ScheduledTask) -> TaskOutcome {
        let _worker = self.workers.acquire().await;
        self.set_state(&task.id, TaskRunState::Running);
        let fired_at = self.now();
        info!(task_id = %task.id, user_id = %task.user_id, due_at = %task.next_run_at, "scheduled task firing");

        let result = self.execute(&task, fired_at).await;
        let success = result.is_ok();
        let last_run_at = success.then_some(fired_at);

        // Rescheduling is keyed on the schedule this run fired with; an edit
        // made while it ran keeps its own `next_run_at`.
        let schedule = &task.schedule;
        let next_run_at = schedule.next_after(fired_at);
        let persisted_next = next_run_at.unwrap_or(fired_at);
        let exhausted = next_run_at.is_none();
        if exhausted {
            warn!(task_id = %task.id, schedule = %schedule, "schedule has no future occurrence, disabling");
        }

        let last_raw = last_run_at.map(format_timestamp);
        let next_raw = format_timestamp(persisted_next);
        let record = queries::RunRecord {
            id: &task.id,
            schedule: schedule.as_str(),
            last_run_at: last_raw.as_deref(),
            next_run_at: &next_raw,
            exhausted,
        };
        match queries::record_run(&self.db, &record).await {
            Ok(true) => {}
            Ok(false) => debug!(task_id = %task.id, "task removed while running"),
            Err(e) => error!(task_id = %task.id, error = %e, "failed to record task run"),
        }

        if let Some(mut slot) = self.tasks.get_mut(&task.id) {
            if let Some(at) = last_run_at {
                slot.task.last_run_at = Some(at);
            }
            if slot.task.schedule.as_str() == schedule.as_str() {
                slot.task.next_run_at = persisted_next;
                if exhausted {
                    slot.task.enabled = false;
                }
            }
            slot.state = if success {
                TaskRunState::Idle
            } else {
                TaskRunState::Failed
            };
        }

        let (result, delivered) = match result {
            Ok((text, delivered)) => {
                info!(task_id = %task.id, delivered, next_run_at = %persisted_next, "scheduled task finished");
                (Ok(text), delivered)
            }
            Err(e) => {
                error!(task_id = %task.id, user_id = %task.user_id, error = %e, next_run_at = %persisted_next, "scheduled task failed");
                (Err(e.to_string()), false)
            }
        };

        TaskOutcome {
            task_id: task.id,
            user_id: task.user_id,
            fired_at,
            next_run_at: persisted_next,
            result,
            delivered,
        }
    }

    /// Generate, persist, then deliver. Returns the text and whether delivery
    /// succeeded; only generation and persistence failures are errors.
    async fn execute(
        &self,
        task: &ScheduledTask,
        fired_at: DateTime<Utc>,
    ) -> Result<(String, bool), YouclawError> {
        let platform = task.delivery_target.platform.as_str();
        let lane = self
            .dispatcher
            .acquire(&task.user_id, self.settings.task_timeout)
            .await?;

        let empty = ConversationContext::empty(&task.user_id, platform, self.settings.context_budget_chars);
        let context = if self.settings.include_memory {
            let query = youclaw_context::render_template(&task.prompt_template, &task.user_id, fired_at, &empty);
            match self
                .context
                .build(&task.user_id, &query, platform, self.settings.context_budget_chars)
                .await
            {
                Ok(context) => context,
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "memory unavailable, running task without it");
                    empty
                }
            }
        } else {
            empty
        };

        let prompt = youclaw_context::render_mission_briefing(
            &task.prompt_template,
            &task.user_id,
            fired_at,
            &context,
        );
        let request = ProviderRequest::new(prompt).with_system_prompt(self.system_prompt.as_str());
        let reply = lane.complete(request).await?;

        self.context
            .memory()
            .write_entry(
                NewMemory::new(&task.user_id, &reply, MemorySource::ScheduledTask).platform(platform),
            )
            .await?;
        drop(lane);

        let text = format!("{DELIVERY_HEADER}\n\n{reply}");
        let delivered = match self.sink.deliver(&task.delivery_target, &text).await {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    task_id = %task.id,
                    target = %task.delivery_target,
                    error = %e,
                    "delivery failed; result kept in memory"
                );
                false
            }
        };
        Ok((reply, delivered))
    }

    /// Tick until cancelled, then wait for in-flight runs.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            tick_secs = self.settings.tick_interval.as_secs(),
            workers = self.settings.max_concurrent_tasks,
            "task scheduler started"
        );
        let mut ticker = tokio::time::interval(self.settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut inflight = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let this = Arc::clone(&self);
                    inflight.spawn(async move { this.run_due().await });
                    self.dispatcher.prune_idle();
                }
                Some(joined) = inflight.join_next(), if !inflight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "scheduler tick aborted");
                    }
                }
            }
        }

        info!(in_flight = inflight.len(), "task scheduler stopping");
        while let Some(joined) = inflight.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "scheduler tick aborted during shutdown");
            }
        }
        info!("task scheduler stopped");
    }
}

fn next_or_invalid(schedule: &Schedule, now: DateTime<Utc>) -> Result<DateTime<Utc>, YouclawError> {
    schedule.next_after(now).ok_or_else(|| {
        YouclawError::InvalidInput(format!("schedule '{schedule}' never fires"))
    })
}
