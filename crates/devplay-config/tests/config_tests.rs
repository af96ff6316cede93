// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the DevPlay configuration system.

use devplay_config::diagnostic::ConfigError;
use devplay_config::model::DevPlayConfig;
use devplay_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use proptest::prelude::*;

#[test]
fn valid_toml_deserializes() {
    let toml = r#"
[app]
name = "devplay-staging"
log_level = "debug"
site_url = "https://devplay.example"

[backend]
url = "https://abc.supabase.co"
anon_key = "anon-123"
request_timeout_secs = 15

[auth]
profile_query_timeout_secs = 5
session_path = "/tmp/devplay/session.json"
callback_path = "/oauth/done"
providers = ["github"]

[forum]
page_size = 50
max_thread_length = 1000
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.name, "devplay-staging");
    assert_eq!(config.app.log_level, "debug");
    assert_eq!(config.backend.url.as_deref(), Some("https://abc.supabase.co"));
    assert_eq!(config.backend.anon_key.as_deref(), Some("anon-123"));
    assert_eq!(config.backend.request_timeout_secs, 15);
    assert_eq!(config.auth.profile_query_timeout_secs, 5);
    assert_eq!(config.auth.providers, vec!["github"]);
    assert_eq!(
        config.auth.redirect_url(&config.app.site_url),
        "https://devplay.example/oauth/done"
    );
    assert_eq!(config.forum.page_size, 50);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.app.name, "devplay");
    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.app.site_url, "http://localhost:5173");
    assert!(config.backend.url.is_none());
    assert_eq!(config.backend.request_timeout_secs, 30);
    assert_eq!(config.auth.profile_query_timeout_secs, 10);
    assert_eq!(config.auth.callback_path, "/auth/callback");
    assert_eq!(config.auth.providers, vec!["google", "github"]);
    assert_eq!(config.forum.page_size, 20);
    assert_eq!(config.forum.max_thread_length, 500);
}

#[test]
fn unknown_key_suggests_correction() {
    let toml = "[backend]\nanon_kye = \"x\"\n";
    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, suggestion: Some(s), .. }
            if key == "anon_kye" && s == "anon_key"
    )));
}

#[test]
fn wrong_type_is_reported() {
    let toml = "[forum]\npage_size = \"many\"\n";
    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. }))
    );
}

#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[backend]
url = "not-a-url"
request_timeout_secs = 0

[auth]
providers = ["google", "kakao"]
"#;
    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 3);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
fn dotted_override_merges_over_toml() {
    let config: DevPlayConfig = Figment::new()
        .merge(Serialized::defaults(DevPlayConfig::default()))
        .merge(Toml::string("[backend]\nanon_key = \"from-file\"\n"))
        .merge(("backend.anon_key", "from-env"))
        .extract()
        .expect("should merge override");
    assert_eq!(config.backend.anon_key.as_deref(), Some("from-env"));
}

#[test]
fn missing_config_files_silently_skipped() {
    let config: DevPlayConfig = Figment::new()
        .merge(Serialized::defaults(DevPlayConfig::default()))
        .merge(Toml::file("/nonexistent/path/devplay.toml"))
        .extract()
        .expect("missing file should be silently skipped");
    assert_eq!(config.app.name, "devplay");
}

#[test]
fn explicit_path_loads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devplay.toml");
    std::fs::write(&path, "[forum]\npage_size = 7\n").unwrap();

    let config = load_and_validate_path(&path).expect("file config should validate");
    assert_eq!(config.forum.page_size, 7);
}

proptest! {
    #[test]
    fn page_size_validation_matches_range(size in 0usize..500) {
        let toml = format!("[forum]\npage_size = {size}\n");
        let result = load_and_validate_str(&toml);
        prop_assert_eq!(result.is_ok(), (1..=100).contains(&size));
    }
}

#[test]
#[serial_test::serial]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devplay.toml");
    std::fs::write(&path, "[auth]\ncallback_path = \"/from-file\"\n").unwrap();

    // SAFETY: serialized with the other env-mutating tests.
    unsafe { std::env::set_var("DEVPLAY_AUTH_CALLBACK_PATH", "/from-env") };
    let result = load_and_validate_path(&path);
    unsafe { std::env::remove_var("DEVPLAY_AUTH_CALLBACK_PATH") };

    let config = result.expect("env override should validate");
    assert_eq!(config.auth.callback_path, "/from-env");
}
