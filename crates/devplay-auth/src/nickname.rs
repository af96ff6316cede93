// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-login nickname collection: creates the user's profile.

use std::sync::Arc;

use devplay_core::error::{CODE_UNDEFINED_TABLE, CODE_UNIQUE_VIOLATION};
use devplay_core::traits::data::{insert_as, select_maybe};
use devplay_core::{DataStore, DevPlayError, Profile, Query, Role, Table, UserId};
use serde::Serialize;
use tracing::{info, warn};

use crate::bootstrap::BootstrapOrchestrator;

/// Blank nickname.
pub const MSG_NICKNAME_REQUIRED: &str = "닉네임을 입력해주세요";
/// Outside 2..=20 characters.
pub const MSG_NICKNAME_LENGTH: &str = "닉네임은 2자 이상 20자 이하로 입력해주세요";
/// Another profile already uses the name.
pub const MSG_NICKNAME_TAKEN: &str = "이미 사용 중인 닉네임입니다";
/// The user already has a profile row.
pub const MSG_PROFILE_EXISTS: &str = "이미 프로필이 존재합니다.";
/// The backend has no profiles table yet.
pub const MSG_PROFILE_TABLE_MISSING: &str =
    "프로필 테이블이 존재하지 않습니다. 데이터베이스를 초기화해주세요.";

const NICKNAME_MIN: usize = 2;
const NICKNAME_MAX: usize = 20;

/// Trims and length-checks a nickname (counted in characters).
pub fn validate_nickname(raw: &str) -> Result<&str, DevPlayError> {
    let nickname = raw.trim();
    if nickname.is_empty() {
        return Err(DevPlayError::validation("nickname", MSG_NICKNAME_REQUIRED));
    }
    let len = nickname.chars().count();
    if !(NICKNAME_MIN..=NICKNAME_MAX).contains(&len) {
        return Err(DevPlayError::validation("nickname", MSG_NICKNAME_LENGTH));
    }
    Ok(nickname)
}

/// Fails with the "taken" message if another profile already uses `nickname`.
///
/// `except` skips the caller's own profile when renaming.
pub async fn ensure_nickname_free(
    data: &dyn DataStore,
    nickname: &str,
    except: Option<&UserId>,
) -> Result<(), DevPlayError> {
    let query = Query::table(Table::Profiles).eq("username", nickname);
    // Uniqueness is enforced server-side only by this pre-check; a
    // concurrent signup with the same name can still race past it.
    let existing = match select_maybe::<Profile>(data, &query).await {
        Ok(found) => found,
        Err(DevPlayError::Integrity(_)) => return Err(taken()),
        Err(e) => return Err(e),
    };
    match existing {
        Some(p) if Some(&p.user_id) != except => Err(taken()),
        _ => Ok(()),
    }
}

fn taken() -> DevPlayError {
    DevPlayError::validation("nickname", MSG_NICKNAME_TAKEN)
}

#[derive(Serialize)]
struct NewProfile<'a> {
    user_id: &'a UserId,
    username: &'a str,
    role: Role,
}

/// Submits the nickname form for the signed-in user.
pub struct NicknameSetup {
    data: Arc<dyn DataStore>,
    orchestrator: Arc<BootstrapOrchestrator>,
}

impl NicknameSetup {
    pub fn new(data: Arc<dyn DataStore>, orchestrator: Arc<BootstrapOrchestrator>) -> Self {
        Self { data, orchestrator }
    }

    /// Validates, pre-checks uniqueness, and inserts the profile.
    ///
    /// On success the store holds the new profile and the gate is `Ready`.
    /// Validation failures are returned as [`DevPlayError::Validation`] for
    /// inline display; nothing is inserted.
    ///
    /// If the session is signed out or replaced while the insert is in
    /// flight, the created profile is returned but not stored.
    pub async fn submit(&self, raw: &str) -> Result<Profile, DevPlayError> {
        let nickname = validate_nickname(raw)?;
        let generation = self.orchestrator.generation();
        let user_id = self
            .orchestrator
            .store()
            .snapshot()
            .user_id()
            .cloned()
            .ok_or(DevPlayError::NotAuthenticated)?;

        ensure_nickname_free(self.data.as_ref(), nickname, None).await?;

        let row = NewProfile {
            user_id: &user_id,
            username: nickname,
            role: Role::User,
        };
        let profile: Profile = insert_as(self.data.as_ref(), Table::Profiles, &row)
            .await
            .map_err(|e| {
                warn!(user_id = %user_id, error = %e, "profile insert failed");
                map_insert_error(e)
            })?;

        info!(user_id = %user_id, username = %profile.username, "profile created");
        self.orchestrator
            .commit_profile(generation, &user_id, Some(profile.clone()));
        Ok(profile)
    }
}

fn map_insert_error(err: DevPlayError) -> DevPlayError {
    match err {
        DevPlayError::Conflict { .. } => DevPlayError::Conflict {
            message: MSG_PROFILE_EXISTS.to_string(),
        },
        DevPlayError::Backend { code: Some(code), .. } if code == CODE_UNIQUE_VIOLATION => {
            DevPlayError::Conflict {
                message: MSG_PROFILE_EXISTS.to_string(),
            }
        }
        DevPlayError::Backend { code: Some(code), .. } if code == CODE_UNDEFINED_TABLE => {
            DevPlayError::Backend {
                code: Some(code),
                message: MSG_PROFILE_TABLE_MISSING.to_string(),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_nickname_rejected() {
        let err = validate_nickname("   ").unwrap_err();
        assert_eq!(err.to_string(), MSG_NICKNAME_REQUIRED);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validate_nickname("가나").is_ok());
        assert_eq!(
            validate_nickname("a").unwrap_err().to_string(),
            MSG_NICKNAME_LENGTH
        );
        assert!(validate_nickname(&"가".repeat(20)).is_ok());
        assert!(validate_nickname(&"가".repeat(21)).is_err());
    }

    #[test]
    fn nickname_is_trimmed() {
        assert_eq!(validate_nickname("  bob  ").unwrap(), "bob");
    }

    #[test]
    fn insert_errors_map_to_messages() {
        let dup = map_insert_error(DevPlayError::Backend {
            code: Some("23505".into()),
            message: "duplicate key".into(),
        });
        assert_eq!(dup.user_message(), MSG_PROFILE_EXISTS);

        let missing = map_insert_error(DevPlayError::Backend {
            code: Some("42P01".into()),
            message: "relation \"profiles\" does not exist".into(),
        });
        assert_eq!(missing.user_message(), MSG_PROFILE_TABLE_MISSING);
    }

    proptest! {
        #[test]
        fn accepted_nicknames_are_trimmed_and_bounded(raw in "\\PC{0,30}") {
            if let Ok(nick) = validate_nickname(&raw) {
                let len = nick.chars().count();
                prop_assert!((NICKNAME_MIN..=NICKNAME_MAX).contains(&len));
                prop_assert_eq!(nick, nick.trim());
            }
        }
    }
}
