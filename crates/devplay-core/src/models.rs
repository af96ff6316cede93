// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for software listings, the forum, and role requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{AuthorSummary, ProfileId, Role};

/// A published software listing (`softwares` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Software {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub download_url: String,
    #[serde(default)]
    pub github_url: Option<String>,
    pub developer_id: ProfileId,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A software listing with its developer's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoftwareWithDeveloper {
    #[serde(flatten)]
    pub software: Software,
    pub developer: Option<AuthorSummary>,
}

/// A released version of a listing (`software_versions` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareVersion {
    pub id: String,
    pub software_id: String,
    pub version: String,
    #[serde(default)]
    pub changelog: Option<String>,
    pub download_url: String,
    pub release_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A forum post (`threads` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub author_id: ProfileId,
    #[serde(default)]
    pub software_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub media_urls: Option<Vec<String>>,
    #[serde(default)]
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reaction kinds available on threads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReactionType {
    Like,
    Cheer,
    Bug,
    Suggestion,
}

/// Per-type reaction tallies for one thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReactionCounts {
    pub like: u64,
    pub cheer: u64,
    pub bug: u64,
    pub suggestion: u64,
}

impl ReactionCounts {
    pub fn add(&mut self, kind: ReactionType) {
        match kind {
            ReactionType::Like => self.like += 1,
            ReactionType::Cheer => self.cheer += 1,
            ReactionType::Bug => self.bug += 1,
            ReactionType::Suggestion => self.suggestion += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.like + self.cheer + self.bug + self.suggestion
    }
}

/// A reaction row (`reactions` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub comment_id: Option<String>,
    pub user_id: ProfileId,
    #[serde(rename = "type")]
    pub kind: ReactionType,
    pub created_at: DateTime<Utc>,
}

/// Software fields shown next to a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareRef {
    pub id: String,
    pub name: String,
}

/// A thread enriched for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadView {
    #[serde(flatten)]
    pub thread: Thread,
    pub author: Option<AuthorSummary>,
    pub software: Option<SoftwareRef>,
    pub comments_count: u64,
    pub reactions: ReactionCounts,
    pub viewer_reaction: Option<ReactionType>,
}

/// A comment row (`comments` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub thread_id: String,
    pub author_id: ProfileId,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment with its author and nested replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<AuthorSummary>,
    pub replies: Vec<CommentNode>,
}

/// Lifecycle of a role elevation request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoleRequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// A request to be elevated to `requested_role` (`role_requests` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRequest {
    pub id: String,
    pub user_id: ProfileId,
    pub requested_role: Role,
    #[serde(default)]
    pub current_role: Option<Role>,
    #[serde(default)]
    pub status: RoleRequestStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<ProfileId>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RoleRequestStatus::Pending
    }
}
