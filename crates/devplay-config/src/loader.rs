// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./devplay.toml` > `~/.config/devplay/devplay.toml` > `/etc/devplay/devplay.toml`
//! with environment variable overrides via `DEVPLAY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DevPlayConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/devplay/devplay.toml`
/// 3. `~/.config/devplay/devplay.toml`
/// 4. `./devplay.toml`
/// 5. `DEVPLAY_*` environment variables
pub fn load_config() -> Result<DevPlayConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<DevPlayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DevPlayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DevPlayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DevPlayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DevPlayConfig::default()))
        .merge(Toml::file("/etc/devplay/devplay.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("devplay/devplay.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("devplay.toml"))
        .merge(env_provider())
}

/// Maps `DEVPLAY_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// keys survive: `DEVPLAY_BACKEND_ANON_KEY` is `backend.anon_key`.
fn env_provider() -> Env {
    Env::prefixed("DEVPLAY_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    for section in ["app", "backend", "auth", "forum"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
