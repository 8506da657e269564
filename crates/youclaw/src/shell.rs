// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `youclaw shell` command implementation.
//!
//! Interactive REPL with a colored prompt and readline history. Each line
//! goes straight to the message router as the given user, so the shell
//! shares memory with every other platform that user talks on.

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use youclaw_config::model::YouclawConfig;
use youclaw_core::YouclawError;

use crate::runtime::Runtime;
use crate::serve::init_tracing;

const SHELL_PLATFORM: &str = "shell";

/// Runs the `youclaw shell` interactive REPL.
pub async fn run_shell(config: YouclawConfig, user_id: String) -> Result<(), YouclawError> {
    init_tracing(&config.agent.log_level);

    let runtime = Runtime::open(config).await?;
    let router = runtime.router();
    let name = router.settings().assistant_name.clone();

    let mut rl = DefaultEditor::new()
        .map_err(|e| YouclawError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", format!("{name} shell").bold().green());
    println!(
        "Talking as {}. Type {} to exit.\n",
        user_id.cyan(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", user_id.green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                match router.try_handle(SHELL_PLATFORM, &user_id, trimmed).await {
                    Ok(reply) => println!("{} {reply}\n", format!("{name}>").bold()),
                    Err(e) if e.is_transient() => {
                        eprintln!("{}", e.user_message().yellow());
                    }
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}
