// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-chat commands handled without inference.

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Forget everything stored for the sender.
    Reset,
    /// Memory counts and service health.
    Stats,
    /// Show the answering model, or switch to the named one.
    Model(Option<String>),
    /// List the models the provider has installed.
    Models,
    Unknown(String),
}

/// Parse `text` as a command when it starts with `prefix` or `/`.
///
/// The first word names the command. Only `model` takes an argument; other
/// commands ignore anything after their name. Returns `None` for ordinary
/// messages, including a bare prefix.
pub fn parse_command(text: &str, prefix: &str) -> Option<Command> {
    let text = text.trim();
    let rest = if !prefix.is_empty() && text.starts_with(prefix) {
        &text[prefix.len()..]
    } else if let Some(rest) = text.strip_prefix('/') {
        rest
    } else {
        return None;
    };

    let mut words = rest.split_whitespace();
    let name = words.next()?.to_lowercase();
    Some(match name.as_str() {
        "help" | "start" => Command::Help,
        "reset" | "forget" => Command::Reset,
        "stats" | "status" | "health" => Command::Stats,
        "model" => Command::Model(words.next().map(str::to_string)),
        "models" => Command::Models,
        _ => Command::Unknown(name),
    })
}

pub(crate) fn help_text(prefix: &str, name: &str) -> String {
    format!(
        "{name} commands:\n\
         {prefix}help - show this list\n\
         {prefix}reset - forget everything I remember about you\n\
         {prefix}stats - memory statistics and service health\n\
         {prefix}models - list installed models\n\
         {prefix}model - which model is answering\n\
         {prefix}model <name> - switch to another installed model"
    )
}

pub(crate) fn unknown_text(prefix: &str, name: &str) -> String {
    format!("Unknown command `{prefix}{name}`. Type `{prefix}help` for the list of commands.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("hello there", "!"), None);
        assert_eq!(parse_command("what is 3 ! 4", "!"), None);
    }

    #[test]
    fn configured_prefix_and_slash_both_work() {
        assert_eq!(parse_command("!help", "!"), Some(Command::Help));
        assert_eq!(parse_command("/reset", "!"), Some(Command::Reset));
        assert_eq!(parse_command("  !STATS now ", "!"), Some(Command::Stats));
        assert_eq!(parse_command("#model", "#"), Some(Command::Model(None)));
        assert_eq!(parse_command("/models", "!"), Some(Command::Models));
    }

    #[test]
    fn model_takes_a_name() {
        assert_eq!(
            parse_command("!model llama3:8b", "!"),
            Some(Command::Model(Some("llama3:8b".into())))
        );
        assert_eq!(
            parse_command("!MODEL  Qwen2.5  extra", "!"),
            Some(Command::Model(Some("Qwen2.5".into())))
        );
    }

    #[test]
    fn bare_prefix_is_plain_text() {
        assert_eq!(parse_command("!", "!"), None);
        assert_eq!(parse_command("/   ", "!"), None);
    }

    #[test]
    fn unknown_command_keeps_its_name() {
        assert_eq!(
            parse_command("!Dance", "!"),
            Some(Command::Unknown("dance".into()))
        );
        assert!(unknown_text("!", "dance").contains("`!help`"));
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text("!", "youclaw");
        for cmd in ["!help", "!reset", "!stats", "!models", "!model <name>"] {
            assert!(help.contains(cmd), "missing {cmd}");
        }
    }
}
