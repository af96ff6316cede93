// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned sessions, profiles, and rows.

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use devplay_core::{AuthUser, Profile, ProfileId, Role, Session, UserId};

/// Fixed timestamp so fixture rows compare equal across runs.
pub const FIXTURE_TIME: &str = "2026-01-01T00:00:00Z";

pub fn session_for(uid: &str) -> Session {
    Session {
        access_token: format!("access-{uid}"),
        refresh_token: format!("refresh-{uid}"),
        token_type: "bearer".to_string(),
        expires_at: Some(4_102_444_800),
        user: AuthUser {
            id: UserId::from(uid),
            email: Some(format!("{uid}@example.com")),
            provider: Some("github".to_string()),
        },
    }
}

pub fn profile_for(uid: &str, username: &str) -> Profile {
    profile_with_role(uid, username, Role::User)
}

pub fn profile_with_role(uid: &str, username: &str, role: Role) -> Profile {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap_or_default();
    Profile {
        id: ProfileId(format!("p-{uid}")),
        user_id: UserId::from(uid),
        username: username.to_string(),
        bio: None,
        avatar_url: None,
        role,
        created_at: at,
        updated_at: at,
    }
}

/// A `profiles` row as the backend would return it.
pub fn profile_row(uid: &str, username: &str, role: &str) -> Value {
    json!({
        "id": format!("p-{uid}"),
        "user_id": uid,
        "username": username,
        "bio": null,
        "avatar_url": null,
        "role": role,
        "created_at": FIXTURE_TIME,
        "updated_at": FIXTURE_TIME,
    })
}

/// A `softwares` row owned by the profile `developer` (a profile id).
pub fn software_row(id: &str, developer: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} description"),
        "category": "game",
        "tags": ["indie"],
        "image_url": null,
        "download_url": format!("https://downloads.example.com/{id}"),
        "github_url": null,
        "developer_id": developer,
        "is_archived": false,
        "created_at": FIXTURE_TIME,
        "updated_at": FIXTURE_TIME,
    })
}
