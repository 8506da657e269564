// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `youclaw memory ...` and `youclaw task ...` command implementations.
//!
//! Plain CRUD against the memory store and the task table. A running
//! `youclaw serve` picks up task changes on its next start.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use colored::Colorize;
use youclaw_agent::ChannelRegistry;
use youclaw_config::model::YouclawConfig;
use youclaw_core::{DeliveryTarget, MemorySource, YouclawError};
use youclaw_cron::{NewTask, ScheduledTask, TaskScheduler};
use youclaw_memory::{MemoryEntry, ScoredEntry};

use crate::console::CONSOLE_PLATFORM;
use crate::runtime::Runtime;
use crate::{MemoryCommands, TaskCommands};

/// Run a `youclaw memory` subcommand.
pub async fn run_memory(config: YouclawConfig, command: MemoryCommands) -> Result<(), YouclawError> {
    let runtime = Runtime::open(config).await?;
    let memory = &runtime.memory;

    match command {
        MemoryCommands::Add { user, text } => {
            let entry = memory.write(&user, &text, MemorySource::Manual, None).await?;
            println!("{} {}", "remembered".green(), entry.id);
        }
        MemoryCommands::Search { user, query, limit } => {
            let hits = memory.query_similar(&user, &query, limit, None).await?;
            if hits.is_empty() {
                println!("{}", "no matching memories".dimmed());
            }
            for hit in &hits {
                println!("{}", format_hit(hit));
            }
        }
        MemoryCommands::List { user, limit } => {
            let entries = memory.recent(&user, limit).await?;
            if entries.is_empty() {
                println!("{}", format!("no memories for {user}").dimmed());
            }
            for entry in &entries {
                println!("{}", format_entry(entry));
            }
        }
        MemoryCommands::Forget { user, id } => {
            memory.delete(&id, &user).await?;
            println!("{} {id}", "forgot".green());
        }
        MemoryCommands::Clear { user, yes } => {
            if !yes {
                println!(
                    "{} this deletes every memory of {user}; re-run with {}",
                    "refusing:".yellow(),
                    "--yes".bold()
                );
                return Ok(());
            }
            let removed = memory.clear_user(&user).await?;
            println!("{} {removed} memories of {user}", "cleared".green());
        }
        MemoryCommands::Stats => {
            let stats = memory.stats().await?;
            println!(
                "{} entries across {} users",
                stats.total_entries, stats.unique_users
            );
        }
    }
    Ok(())
}

/// Run a `youclaw task` subcommand.
pub async fn run_task(config: YouclawConfig, command: TaskCommands) -> Result<(), YouclawError> {
    let runtime = Runtime::open(config).await?;
    // Nothing is delivered from the CLI, so no channel is registered.
    let scheduler: TaskScheduler = runtime.scheduler(Arc::new(ChannelRegistry::new()));
    scheduler.load().await?;

    match command {
        TaskCommands::Add {
            user,
            schedule,
            prompt,
            platform,
            channel,
        } => {
            let task = scheduler
                .create_task(NewTask {
                    delivery_target: DeliveryTarget {
                        platform: platform.unwrap_or_else(|| CONSOLE_PLATFORM.to_string()),
                        channel: channel.unwrap_or_else(|| user.clone()),
                    },
                    user_id: user,
                    schedule,
                    prompt_template: prompt,
                })
                .await?;
            println!("{} {}", "created".green(), format_task(&task));
            print_restart_hint();
        }
        TaskCommands::List { user } => {
            let tasks = scheduler.list_tasks(user.as_deref());
            if tasks.is_empty() {
                println!("{}", "no scheduled tasks".dimmed());
            }
            for task in &tasks {
                println!("{}", format_task(task));
            }
        }
        TaskCommands::Remove { user, id } => {
            scheduler.delete_task(&id, &user).await?;
            println!("{} {id}", "removed".green());
            print_restart_hint();
        }
        TaskCommands::Enable { user, id } => {
            let task = scheduler.set_enabled(&id, &user, true).await?;
            println!("{} {}", "enabled".green(), format_task(&task));
            print_restart_hint();
        }
        TaskCommands::Disable { user, id } => {
            let task = scheduler.set_enabled(&id, &user, false).await?;
            println!("{} {}", "disabled".green(), format_task(&task));
            print_restart_hint();
        }
    }
    Ok(())
}

fn print_restart_hint() {
    println!(
        "{}",
        "a running `youclaw serve` applies this after restart".dimmed()
    );
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn format_entry(entry: &MemoryEntry) -> String {
    let label = match entry.role {
        Some(role) => role.to_string(),
        None => entry.source.to_string(),
    };
    format!(
        "{}  [{}] {}: {}",
        entry.id,
        format_time(entry.created_at),
        label,
        entry.text
    )
}

fn format_hit(hit: &ScoredEntry) -> String {
    format!("{:.3}  {}", hit.score, format_entry(&hit.entry))
}

fn format_task(task: &ScheduledTask) -> String {
    let state = if task.enabled { "on" } else { "off" };
    let last = task
        .last_run_at
        .map(format_time)
        .unwrap_or_else(|| "never".to_string());
    format!(
        "{} [{state}] user={} schedule=\"{}\" next={} last={} -> {}\n    {}",
        task.id,
        task.user_id,
        task.schedule,
        format_time(task.next_run_at),
        last,
        task.delivery_target,
        task.prompt_template
    )
}
