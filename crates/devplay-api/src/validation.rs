// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input validation shared by the domain services.
//!
//! Lengths are counted in characters, not bytes. Messages are user-facing.

use std::sync::LazyLock;

use devplay_core::DevPlayError;
use regex::Regex;
use url::Url;

static USERNAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_가-힣]+$").unwrap());

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d+\.\d+\.\d+(?:-[a-zA-Z0-9.-]+)?$").unwrap());

pub const MSG_VERSION_FORMAT: &str = "버전 형식이 올바르지 않습니다. (예: v1.0.0, 1.2.3)";

pub fn validate_username(username: &str) -> Result<(), DevPlayError> {
    let fail = |msg: &str| Err(DevPlayError::validation("username", msg));
    let len = username.chars().count();
    if username.is_empty() {
        return fail("사용자명을 입력해주세요.");
    }
    if len < 2 {
        return fail("사용자명은 2자 이상이어야 합니다.");
    }
    if len > 20 {
        return fail("사용자명은 20자 이하여야 합니다.");
    }
    if !USERNAME_CHARS.is_match(username) {
        return fail("사용자명은 영문, 숫자, 언더스코어(_), 한글만 사용 가능합니다.");
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Absolute URL by WHATWG parsing rules; any scheme is accepted.
pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url).is_ok()
}

/// Fails with `"{field}을(를) 입력해주세요."` for empty or blank input.
pub fn validate_required(value: &str, field: &str) -> Result<(), DevPlayError> {
    if value.trim().is_empty() {
        return Err(DevPlayError::validation(
            field,
            format!("{field}을(를) 입력해주세요."),
        ));
    }
    Ok(())
}

/// Bounds-checks `value`; empty input passes (pair with [`validate_required`]).
pub fn validate_length(
    value: &str,
    min: usize,
    max: usize,
    field: &str,
) -> Result<(), DevPlayError> {
    if value.is_empty() {
        return Ok(());
    }
    let len = value.chars().count();
    if len < min {
        return Err(DevPlayError::validation(
            field,
            format!("{field}은(는) {min}자 이상이어야 합니다."),
        ));
    }
    if len > max {
        return Err(DevPlayError::validation(
            field,
            format!("{field}은(는) {max}자 이하여야 합니다."),
        ));
    }
    Ok(())
}

pub fn validate_url(value: &str, field: &str) -> Result<(), DevPlayError> {
    if is_valid_url(value) {
        Ok(())
    } else {
        Err(DevPlayError::validation(
            field,
            format!("{field} 형식이 올바르지 않습니다."),
        ))
    }
}

/// Accepts `1.2.3`, `v1.2.3`, and pre-release suffixes like `v1.0.0-beta.1`.
pub fn validate_version(version: &str) -> Result<(), DevPlayError> {
    if VERSION.is_match(version) {
        Ok(())
    } else {
        Err(DevPlayError::validation("version", MSG_VERSION_FORMAT))
    }
}

/// Shortens `text` to at most `max` characters, ending in `suffix`.
pub fn truncate_text(text: &str, max: usize, suffix: &str) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(suffix.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(suffix);
    out
}
