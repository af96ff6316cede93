// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps backend error responses onto [`DevPlayError`].

use devplay_core::DevPlayError;
use devplay_core::error::{CODE_NO_ROWS, CODE_UNIQUE_VIOLATION};
use reqwest::StatusCode;

use crate::types::ErrorBody;

/// Postgres "insufficient privilege", raised by row-level policies.
const CODE_INSUFFICIENT_PRIVILEGE: &str = "42501";

/// Classifies a non-success response.
pub fn map_error(status: StatusCode, body: &str) -> DevPlayError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code();
    let message = parsed.message().unwrap_or_else(|| {
        if body.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            body.trim().to_string()
        }
    });

    match code.as_deref() {
        Some(CODE_NO_ROWS) => DevPlayError::not_found("row", message),
        Some(CODE_UNIQUE_VIOLATION) => DevPlayError::Conflict { message },
        Some(CODE_INSUFFICIENT_PRIVILEGE) => DevPlayError::PermissionDenied { message },
        _ if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            DevPlayError::PermissionDenied { message }
        }
        _ => DevPlayError::Backend { code, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_is_not_found() {
        let err = map_error(
            StatusCode::NOT_ACCEPTABLE,
            r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#,
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn unique_violation_is_conflict() {
        let err = map_error(
            StatusCode::CONFLICT,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint \"profiles_username_key\""}"#,
        );
        assert!(matches!(err, DevPlayError::Conflict { .. }));
    }

    #[test]
    fn auth_statuses_and_policy_denials() {
        assert!(matches!(
            map_error(StatusCode::UNAUTHORIZED, r#"{"message":"JWT expired"}"#),
            DevPlayError::PermissionDenied { .. }
        ));
        assert!(matches!(
            map_error(
                StatusCode::BAD_REQUEST,
                r#"{"code":"42501","message":"new row violates row-level security policy"}"#
            ),
            DevPlayError::PermissionDenied { .. }
        ));
    }

    #[test]
    fn other_codes_keep_code_and_message() {
        let err = map_error(
            StatusCode::NOT_FOUND,
            r#"{"code":"42P01","message":"relation \"public.profiles\" does not exist"}"#,
        );
        match err {
            DevPlayError::Backend { code, message } => {
                assert_eq!(code.as_deref(), Some("42P01"));
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unparseable_body_falls_back_to_text() {
        let err = map_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "backend error: upstream down");
        let empty = map_error(StatusCode::BAD_GATEWAY, "");
        assert!(empty.to_string().contains("502"));
    }
}
