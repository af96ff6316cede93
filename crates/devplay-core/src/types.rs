// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity, session, and profile types shared across the DevPlay workspace.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identity-provider user identifier. Stable and provider-issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Primary key of a row in the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for ProfileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&UserId> for serde_json::Value {
    fn from(id: &UserId) -> Self {
        serde_json::Value::String(id.0.clone())
    }
}

impl From<&ProfileId> for serde_json::Value {
    fn from(id: &ProfileId) -> Self {
        serde_json::Value::String(id.0.clone())
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies which external collaborator an adapter stands in for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Identity,
    Data,
}

/// Application role stored on a profile.
///
/// Ordered: `User < Developer < Admin`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Developer,
    Admin,
}

impl Role {
    /// Numeric level in the role hierarchy.
    pub fn level(self) -> u8 {
        match self {
            Role::User => 0,
            Role::Developer => 1,
            Role::Admin => 2,
        }
    }

    /// Korean label used in permission messages.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "일반 사용자",
            Role::Developer => "개발자",
            Role::Admin => "관리자",
        }
    }
}

/// OAuth providers offered on the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
}

/// The identity provider's user record embedded in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Identity provider's user id.
    pub id: UserId,
    /// Absent for providers that do not share an email.
    #[serde(default)]
    pub email: Option<String>,
    /// OAuth provider the user signed in with, e.g. `github`.
    #[serde(default)]
    pub provider: Option<String>,
}

/// A live authentication grant. Owned by the identity subsystem; read-only here.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token sent with every backend request.
    pub access_token: String,
    /// Exchanged for a new access token when it expires.
    pub refresh_token: String,
    /// Usually `bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix timestamp (seconds) at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// The user this grant belongs to.
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// Whether the access token has expired at `now` (unix seconds).
    ///
    /// Sessions without an expiry never expire client-side.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

/// Application-level user record keyed by [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Row id; foreign keys from other tables point here.
    pub id: ProfileId,
    /// Owning identity; at most one profile per user.
    pub user_id: UserId,
    /// Unique nickname, 2 to 20 characters.
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Defaults to `user` for rows written before roles existed.
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author fields attached to listings and posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl From<&Profile> for AuthorSummary {
    fn from(p: &Profile) -> Self {
        Self {
            username: p.username.clone(),
            avatar_url: p.avatar_url.clone(),
            role: p.role,
        }
    }
}

/// Notifications pushed by the identity subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// First notification after subscribing; carries the restored session, if any.
    InitialSession(Option<Session>),
    SignedIn(Session),
    SignedOut,
    TokenRefreshed(Session),
    UserUpdated(Session),
}

impl AuthEvent {
    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthEvent::InitialSession(_) => "INITIAL_SESSION",
            AuthEvent::SignedIn(_) => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::TokenRefreshed(_) => "TOKEN_REFRESHED",
            AuthEvent::UserUpdated(_) => "USER_UPDATED",
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthEvent::InitialSession(s) => s.as_ref(),
            AuthEvent::SignedIn(s) | AuthEvent::TokenRefreshed(s) | AuthEvent::UserUpdated(s) => {
                Some(s)
            }
            AuthEvent::SignedOut => None,
        }
    }
}
