// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the DevPlay client core.

use std::time::Duration;

use thiserror::Error;

/// Backend error code for "zero (or many) rows where one was requested".
pub const CODE_NO_ROWS: &str = "PGRST116";

/// Backend error code for a unique constraint violation.
pub const CODE_UNIQUE_VIOLATION: &str = "23505";

/// Backend error code for a missing relation.
pub const CODE_UNDEFINED_TABLE: &str = "42P01";

/// The primary error type used across adapter traits, auth flows and domain services.
#[derive(Debug, Error)]
pub enum DevPlayError {
    /// Configuration errors (invalid TOML, bad backend URL, missing keys).
    #[error("configuration error: {0}")]
    Config(String),

    /// The operation needs a signed-in user and there is none.
    #[error("User not authenticated")]
    NotAuthenticated,

    /// A lookup that required exactly one row found none.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Client-side validation failure, shown inline next to the offending field.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// A uniqueness conflict reported by the data subsystem.
    #[error("{message}")]
    Conflict { message: String },

    /// Expired token or row-level policy denial.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// Network failure or undecodable response.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Any other error reported by the backend, with its code if one was given.
    #[error("backend error{}: {message}", code_suffix(.code))]
    Backend {
        code: Option<String>,
        message: String,
    },

    /// Data violates an invariant this client relies on but does not enforce.
    #[error("data integrity error: {0}")]
    Integrity(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
}

impl DevPlayError {
    /// Shorthand for a validation error on `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a not-found error.
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }

    /// Wraps a transport-level failure.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for the expected "no rows" outcome.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Backend { code: Some(code), .. } => code == CODE_NO_ROWS,
            _ => false,
        }
    }

    /// True for client-side validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// The text surfaced to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "인증이 필요합니다. 다시 로그인해주세요.".to_string(),
            Self::PermissionDenied { .. } => "접근 권한이 없습니다.".to_string(),
            Self::Validation { message, .. } | Self::Conflict { message } => message.clone(),
            Self::Backend { message, .. } => message.clone(),
            Self::Transport { .. } => "API 요청 중 오류가 발생했습니다.".to_string(),
            other => other.to_string(),
        }
    }

    /// User-facing message prefixed with the action that failed, e.g. `[권한 요청] ...`.
    pub fn notice(&self, context: &str) -> String {
        format!("[{context}] {}", self.user_message())
    }
}
