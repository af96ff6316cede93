// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the DevPlay client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level DevPlay configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DevPlayConfig {
    /// Application identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Hosted backend connection settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Session bootstrap and OAuth settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Forum listing settings.
    #[serde(default)]
    pub forum: ForumConfig,
}

/// Application identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Public origin of the site; OAuth redirects land under it.
    #[serde(default = "default_site_url")]
    pub site_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
            site_url: default_site_url(),
        }
    }
}

fn default_app_name() -> String {
    "devplay".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_site_url() -> String {
    "http://localhost:5173".to_string()
}

/// Hosted backend connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`. `None` means not configured.
    #[serde(default)]
    pub url: Option<String>,

    /// Public anonymous API key sent with every request.
    #[serde(default)]
    pub anon_key: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether both the URL and the key are present.
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
            && self.anon_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Session bootstrap and OAuth configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Upper bound on a single profile lookup during bootstrap.
    #[serde(default = "default_profile_query_timeout_secs")]
    pub profile_query_timeout_secs: u64,

    /// Where the persisted session JSON lives.
    #[serde(default = "default_session_path")]
    pub session_path: String,

    /// Path appended to `app.site_url` for the OAuth redirect.
    #[serde(default = "default_callback_path")]
    pub callback_path: String,

    /// OAuth providers offered at login.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            profile_query_timeout_secs: default_profile_query_timeout_secs(),
            session_path: default_session_path(),
            callback_path: default_callback_path(),
            providers: default_providers(),
        }
    }
}

impl AuthConfig {
    pub fn profile_query_timeout(&self) -> Duration {
        Duration::from_secs(self.profile_query_timeout_secs)
    }

    /// Full redirect URL for OAuth sign-in.
    pub fn redirect_url(&self, site_url: &str) -> String {
        format!(
            "{}/{}",
            site_url.trim_end_matches('/'),
            self.callback_path.trim_start_matches('/')
        )
    }
}

fn default_profile_query_timeout_secs() -> u64 {
    10
}

fn default_session_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("devplay").join("session.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("session.json"))
        .to_string_lossy()
        .into_owned()
}

fn default_callback_path() -> String {
    "/auth/callback".to_string()
}

fn default_providers() -> Vec<String> {
    vec!["google".to_string(), "github".to_string()]
}

/// Forum listing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ForumConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum thread body length in characters.
    #[serde(default = "default_max_thread_length")]
    pub max_thread_length: usize,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_thread_length: default_max_thread_length(),
        }
    }
}

fn default_page_size() -> usize {
    20
}

fn default_max_thread_length() -> usize {
    500
}
