// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `youclaw serve` command implementation.
//!
//! Starts the scheduler tick loop and the agent loop over the console
//! channel, then waits for SIGINT/SIGTERM. When stdin closes the scheduler
//! keeps running until a shutdown signal arrives.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use youclaw_agent::shutdown::install_signal_handler;
use youclaw_agent::{AgentLoop, ChannelRegistry};
use youclaw_config::model::YouclawConfig;
use youclaw_core::YouclawError;

use crate::console::ConsoleChannel;
use crate::runtime::Runtime;

/// Initialize the tracing subscriber with the configured log level.
///
/// `RUST_LOG` takes precedence over `agent.log_level` when set.
pub(crate) fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("youclaw={log_level},warn")));

    // try_init so a second call (tests, shell after serve) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

/// Run the `youclaw serve` command.
pub async fn run_serve(config: YouclawConfig, console_user: String) -> Result<(), YouclawError> {
    init_tracing(&config.agent.log_level);
    info!(name = %config.agent.name, host = %config.ollama.host, "starting youclaw serve");

    let runtime = Runtime::open(config).await?;

    let mut registry = ChannelRegistry::new();
    registry.add_channel(Box::new(ConsoleChannel::new(
        console_user,
        runtime.config.agent.name.clone(),
    )));
    registry.connect_all().await?;
    let registry = Arc::new(registry);

    let cancel = install_signal_handler();

    let scheduler = if runtime.config.scheduler.enabled {
        let scheduler = Arc::new(runtime.scheduler(registry.clone()));
        let loaded = scheduler.load().await?;
        info!(tasks = loaded, "scheduled tasks loaded");
        Some(tokio::spawn(scheduler.run(cancel.clone())))
    } else {
        info!("scheduler disabled");
        None
    };

    let agent = AgentLoop::new(Arc::clone(&registry), Arc::new(runtime.router()))
        .with_drain_timeout(runtime.config.agent.reply_timeout());
    let result = agent.run(cancel.clone()).await;
    if let Err(e) = &result {
        error!(error = %e, "agent loop failed");
    }

    if let Some(handle) = scheduler {
        if result.is_ok() && !cancel.is_cancelled() {
            info!("console closed, scheduler keeps running until shutdown");
            cancel.cancelled().await;
        }
        cancel.cancel();
        if let Err(e) = handle.await {
            error!(error = %e, "scheduler task panicked");
        }
    }

    if runtime.config.storage.wal_mode
        && let Err(e) = runtime.db.checkpoint().await
    {
        warn!(error = %e, "final WAL checkpoint failed");
    }

    info!("youclaw stopped");
    result
}
