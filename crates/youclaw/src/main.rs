// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! YouClaw - a personal AI assistant with semantic memory and scheduled tasks.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod admin;
mod console;
mod runtime;
mod serve;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

/// YouClaw - a personal AI assistant with semantic memory and scheduled tasks.
#[derive(Parser, Debug)]
#[command(name = "youclaw", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scheduler and chat over the console until SIGINT/SIGTERM.
    Serve {
        /// User id attributed to console input.
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Launch an interactive REPL session.
    Shell {
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// Inspect and edit stored memories.
    #[command(subcommand)]
    Memory(MemoryCommands),
    /// Manage scheduled tasks.
    #[command(subcommand)]
    Task(TaskCommands),
}

#[derive(Subcommand, Debug)]
pub(crate) enum MemoryCommands {
    /// Store a note for a user.
    Add { user: String, text: String },
    /// Rank a user's memories by similarity to a query.
    Search {
        user: String,
        query: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Show a user's newest memories.
    List {
        user: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Delete one memory.
    Forget { user: String, id: String },
    /// Delete every memory of a user.
    Clear {
        user: String,
        #[arg(long)]
        yes: bool,
    },
    /// Entry and user counts.
    Stats,
}

#[derive(Subcommand, Debug)]
pub(crate) enum TaskCommands {
    /// Schedule a prompt, e.g. `task add alice "0 8 * * *" "Plan my day"`.
    Add {
        user: String,
        /// Cron expression or interval such as "every 2 hours".
        schedule: String,
        prompt: String,
        /// Delivery platform (defaults to the console).
        #[arg(long)]
        platform: Option<String>,
        /// Delivery channel on that platform (defaults to the user id).
        #[arg(long)]
        channel: Option<String>,
    },
    /// List tasks, optionally for one user.
    List {
        #[arg(long)]
        user: Option<String>,
    },
    Remove { user: String, id: String },
    Enable { user: String, id: String },
    Disable { user: String, id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => youclaw_config::load_and_validate_path(path),
        None => youclaw_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            youclaw_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve { user }) => serve::run_serve(config, user).await,
        Some(Commands::Shell { user }) => shell::run_shell(config, user).await,
        Some(Commands::Memory(command)) => admin::run_memory(config, command).await,
        Some(Commands::Task(command)) => admin::run_task(config, command).await,
        None => {
            println!("youclaw: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    #[serial_test::serial]
    fn binary_loads_config_defaults() {
        let config = youclaw_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.agent.name, "youclaw");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn task_add_parses_schedule_and_delivery() {
        let cli = Cli::parse_from([
            "youclaw",
            "task",
            "add",
            "alice",
            "every 2 hours",
            "Check the news",
            "--channel",
            "alice-dm",
        ]);
        match cli.command {
            Some(Commands::Task(TaskCommands::Add {
                user,
                schedule,
                platform,
                channel,
                ..
            })) => {
                assert_eq!(user, "alice");
                assert_eq!(schedule, "every 2 hours");
                assert_eq!(platform, None);
                assert_eq!(channel.as_deref(), Some("alice-dm"));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["youclaw", "memory", "stats", "--config", "/tmp/y.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/y.toml")));
    }
}
