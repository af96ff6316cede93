// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role-gated access to protected screens.

use devplay_core::Role;
use serde::Serialize;

use crate::store::AuthSnapshot;

/// Result of checking a snapshot against a required role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Loading,
    LoginRequired,
    Insufficient {
        required: Role,
        current: Option<Role>,
    },
    Granted,
}

impl AccessDecision {
    pub fn is_granted(self) -> bool {
        self == AccessDecision::Granted
    }

    /// Message shown in place of the protected content.
    pub fn message(self) -> Option<String> {
        match self {
            AccessDecision::Loading | AccessDecision::Granted => None,
            AccessDecision::LoginRequired => Some("로그인이 필요합니다".to_string()),
            AccessDecision::Insufficient { required, current } => Some(format!(
                "이 페이지는 {} 권한이 필요합니다. 현재 권한: {}",
                required.label(),
                current.map_or("없음", Role::label)
            )),
        }
    }
}

/// Role checks in front of protected screens.
pub struct Access;

impl Access {
    /// Loading wins, then authentication, then the role hierarchy.
    ///
    /// A signed-in user without a profile passes a plain `User` requirement
    /// but nothing higher.
    pub fn check(snapshot: &AuthSnapshot, required: Role) -> AccessDecision {
        if snapshot.is_loading {
            return AccessDecision::Loading;
        }
        if snapshot.session.is_none() {
            return AccessDecision::LoginRequired;
        }
        let current = snapshot.profile.as_ref().map(|p| p.role);
        let level = current.map(Role::level);
        match level {
            Some(l) if l >= required.level() => AccessDecision::Granted,
            None if required == Role::User => AccessDecision::Granted,
            _ => AccessDecision::Insufficient { required, current },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devplay_test_utils::fixtures::{profile_with_role, session_for};

    fn signed_in(role: Option<Role>) -> AuthSnapshot {
        AuthSnapshot {
            session: Some(session_for("u1")),
            profile: role.map(|r| profile_with_role("u1", "alice", r)),
            is_loading: false,
            error: None,
            needs_setup: false,
        }
    }

    #[test]
    fn loading_and_logged_out() {
        assert_eq!(Access::check(&AuthSnapshot::initial(), Role::User), AccessDecision::Loading);
        let out = AuthSnapshot {
            is_loading: false,
            ..AuthSnapshot::initial()
        };
        assert_eq!(Access::check(&out, Role::User), AccessDecision::LoginRequired);
    }

    #[test]
    fn role_hierarchy() {
        assert!(Access::check(&signed_in(Some(Role::Admin)), Role::Developer).is_granted());
        assert!(Access::check(&signed_in(Some(Role::Developer)), Role::Developer).is_granted());
        assert_eq!(
            Access::check(&signed_in(Some(Role::User)), Role::Admin),
            AccessDecision::Insufficient {
                required: Role::Admin,
                current: Some(Role::User)
            }
        );
    }

    #[test]
    fn missing_profile_only_passes_user_requirement() {
        assert!(Access::check(&signed_in(None), Role::User).is_granted());
        assert!(!Access::check(&signed_in(None), Role::Developer).is_granted());
    }

    #[test]
    fn insufficient_message_names_roles() {
        let msg = Access::check(&signed_in(Some(Role::User)), Role::Developer)
            .message()
            .unwrap();
        assert!(msg.contains("개발자"));
        assert!(msg.contains("일반 사용자"));
    }
}
