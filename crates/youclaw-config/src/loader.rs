// SPDX-FileCopyrightText: 2026 YouClaw Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./youclaw.toml` > `~/.config/youclaw/youclaw.toml` > `/etc/youclaw/youclaw.toml`
//! with environment variable overrides via `YOUCLAW_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::YouclawConfig;

/// Config sections addressable from `YOUCLAW_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["agent", "ollama", "storage", "memory", "scheduler"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/youclaw/youclaw.toml` (system-wide)
/// 3. `~/.config/youclaw/youclaw.toml` (user XDG config)
/// 4. `./youclaw.toml` (local directory)
/// 5. `YOUCLAW_*` environment variables
pub fn load_config() -> Result<YouclawConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<YouclawConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(YouclawConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<YouclawConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(YouclawConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(YouclawConfig::default()))
        .merge(Toml::file("/etc/youclaw/youclaw.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("youclaw/youclaw.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("youclaw.toml"))
        .merge(env_provider())
}

/// Map a prefix-stripped env var name to a dotted config key.
///
/// Figment hands over the name in its original case, so it is lowercased
/// first. Only the first underscore after a known section name becomes a
/// dot: `OLLAMA_CHAT_MODEL` maps to `ollama.chat_model`, not `ollama.chat.model`.
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}

fn env_provider() -> Env {
    Env::prefixed("YOUCLAW_").map(|key| map_env_key(key.as_str()).into())
}
