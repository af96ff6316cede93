// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::DevPlayConfig;

const KNOWN_PROVIDERS: &[&str] = &["google", "github"];
const KNOWN_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &DevPlayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !KNOWN_LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "app.log_level `{}` is not one of {}",
                config.app.log_level,
                KNOWN_LOG_LEVELS.join(", ")
            ),
        });
    }

    if !is_http_url(&config.app.site_url) {
        errors.push(ConfigError::Validation {
            message: format!("app.site_url `{}` must be an http(s) URL", config.app.site_url),
        });
    }

    if let Some(url) = config.backend.url.as_deref()
        && !is_http_url(url)
    {
        errors.push(ConfigError::Validation {
            message: format!("backend.url `{url}` must be an http(s) URL"),
        });
    }

    if let Some(key) = config.backend.anon_key.as_deref()
        && key.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "backend.anon_key must not be empty when set".to_string(),
        });
    }

    if config.backend.request_timeout_secs < 1 {
        errors.push(ConfigError::Validation {
            message: "backend.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.auth.profile_query_timeout_secs < 1 {
        errors.push(ConfigError::Validation {
            message: "auth.profile_query_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.auth.session_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "auth.session_path must not be empty".to_string(),
        });
    }

    if !config.auth.callback_path.starts_with('/') {
        errors.push(ConfigError::Validation {
            message: format!(
                "auth.callback_path `{}` must start with `/`",
                config.auth.callback_path
            ),
        });
    }

    for provider in &config.auth.providers {
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "auth.providers contains unknown provider `{provider}` (expected one of {})",
                    KNOWN_PROVIDERS.join(", ")
                ),
            });
        }
    }

    if !(1..=100).contains(&config.forum.page_size) {
        errors.push(ConfigError::Validation {
            message: format!(
                "forum.page_size must be between 1 and 100, got {}",
                config.forum.page_size
            ),
        });
    }

    if config.forum.max_thread_length == 0 {
        errors.push(ConfigError::Validation {
            message: "forum.max_thread_length must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}
