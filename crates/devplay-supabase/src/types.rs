// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the auth endpoints.

use devplay_core::{AuthUser, Session, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /auth/v1/user` response (only the fields we read).
#[derive(Debug, Clone, Deserialize)]
pub struct UserResponse {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: Value,
}

impl From<UserResponse> for AuthUser {
    fn from(u: UserResponse) -> Self {
        let provider = u
            .app_metadata
            .get("provider")
            .and_then(Value::as_str)
            .map(str::to_string);
        AuthUser {
            id: UserId(u.id),
            email: u.email.filter(|e| !e.is_empty()),
            provider,
        }
    }
}

/// `POST /auth/v1/token` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: UserResponse,
}

fn bearer() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    /// Converts to a session, deriving `expires_at` from `expires_in` when absent.
    pub fn into_session(self, now: i64) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type,
            expires_at,
            user: self.user.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Error body shapes from both the REST and auth endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl ErrorBody {
    /// A string code, preferring the REST `code` over the auth `error_code`.
    pub fn code(&self) -> Option<String> {
        match &self.code {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => self.error_code.clone().or_else(|| Some(n.to_string())),
            _ => self.error_code.clone().or_else(|| self.error.clone()),
        }
    }

    pub fn message(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error_description.clone())
            .or_else(|| self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_response_derives_expiry() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": { "id": "u1", "email": "u1@example.com", "app_metadata": { "provider": "github" } }
        }))
        .unwrap();
        let session = token.into_session(1_000);
        assert_eq!(session.expires_at, Some(4_600));
        assert_eq!(session.user.provider.as_deref(), Some("github"));
        assert_eq!(session.token_type, "bearer");
    }

    #[test]
    fn error_body_shapes() {
        let rest: ErrorBody =
            serde_json::from_value(json!({ "code": "23505", "message": "dup" })).unwrap();
        assert_eq!(rest.code().as_deref(), Some("23505"));

        let auth: ErrorBody = serde_json::from_value(
            json!({ "code": 400, "error_code": "refresh_token_not_found", "msg": "Invalid Refresh Token" }),
        )
        .unwrap();
        assert_eq!(auth.code().as_deref(), Some("refresh_token_not_found"));
        assert_eq!(auth.message().as_deref(), Some("Invalid Refresh Token"));

        let oauth: ErrorBody = serde_json::from_value(
            json!({ "error": "invalid_grant", "error_description": "expired" }),
        )
        .unwrap();
        assert_eq!(oauth.code().as_deref(), Some("invalid_grant"));
        assert_eq!(oauth.message().as_deref(), Some("expired"));
    }
}
