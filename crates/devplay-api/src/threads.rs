// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forum threads with their comments and reactions.
//!
//! Listings are enriched per thread with the author, the linked software,
//! a comment count, reaction tallies, and the viewer's own reaction.

use std::collections::HashMap;
use std::sync::Arc;

use devplay_config::ForumConfig;
use devplay_core::models::{
    Comment, CommentNode, Reaction, ReactionCounts, ReactionType, SoftwareRef, Thread, ThreadView,
};
use devplay_core::traits::data::{
    decode_row, insert_as, select_all, select_maybe, select_one, update_one,
};
use devplay_core::{
    AuthorSummary, DataStore, DevPlayError, IdentityProvider, ProfileId, Query, Table,
};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::current::CurrentProfile;
use crate::profiles::ProfileService;
use crate::validation::validate_required;

/// Blank thread or comment body.
pub const MSG_CONTENT_REQUIRED: &str = "내용을 입력해주세요.";
/// Body shown in place of a soft-deleted comment.
pub const DELETED_COMMENT_TEXT: &str = "삭제된 댓글입니다.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThreadSort {
    /// Newest first.
    #[default]
    Latest,
    /// Highest score first, then newest.
    Popular,
}

/// Filters and paging for [`ThreadService::list_threads`].
#[derive(Debug, Clone, Default)]
pub struct ThreadListOptions {
    /// Latest first, or by score.
    pub sort: ThreadSort,
    /// Only threads attached to this software.
    pub software_id: Option<String>,
    /// Only threads by this author.
    pub author_id: Option<ProfileId>,
    /// Defaults to the configured page size.
    pub limit: Option<usize>,
    /// Rows to skip for paging.
    pub offset: usize,
}

/// A new thread by the signed-in profile.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateThread {
    /// Body; trimmed and length-checked before insert.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateThread {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_urls: Option<Vec<String>>,
}

/// A comment, or a reply when `parent_id` is set.
#[derive(Debug, Clone, Serialize)]
pub struct CreateComment {
    /// Thread the comment belongs to.
    pub thread_id: String,
    /// Body; must not be blank.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Forum threads with their comment trees and reactions.
///
/// Listed threads carry author and reaction details plus the viewer's own
/// reaction.
pub struct ThreadService {
    data: Arc<dyn DataStore>,
    current: CurrentProfile,
    profiles: ProfileService,
    max_length: usize,
    page_size: usize,
}

impl ThreadService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        data: Arc<dyn DataStore>,
        forum: &ForumConfig,
    ) -> Self {
        Self {
            current: CurrentProfile::new(identity, data.clone()),
            profiles: ProfileService::new(data.clone()),
            data,
            max_length: forum.max_thread_length,
            page_size: forum.page_size,
        }
    }

    /// Trims, then enforces non-empty and the configured maximum length.
    fn validate_content(&self, raw: &str) -> Result<String, DevPlayError> {
        let content = raw.trim();
        if content.is_empty() {
            return Err(DevPlayError::validation("content", MSG_CONTENT_REQUIRED));
        }
        if content.chars().count() > self.max_length {
            return Err(DevPlayError::validation(
                "content",
                format!("내용은 {}자 이하로 입력해주세요.", self.max_length),
            ));
        }
        Ok(content.to_string())
    }

    // ---- Threads ----

    pub async fn create_thread(&self, mut input: CreateThread) -> Result<ThreadView, DevPlayError> {
        input.content = self.validate_content(&input.content)?;
        let author_id = self.current.profile_id().await?;
        let row = json!({
            "author_id": author_id,
            "content": input.content,
            "software_id": input.software_id,
            "media_urls": input.media_urls,
        });
        let stored = self.data.insert(Table::Threads, row).await?;
        let thread: Thread = decode_row(Table::Threads, stored)?;
        info!(thread_id = %thread.id, author_id = %author_id, "thread created");
        self.enrich_one(thread).await
    }

    pub async fn list_threads(&self, options: &ThreadListOptions) -> Result<Vec<ThreadView>, DevPlayError> {
        let mut query = Query::table(Table::Threads);
        if let Some(software_id) = &options.software_id {
            query = query.eq("software_id", software_id.as_str());
        }
        if let Some(author_id) = &options.author_id {
            query = query.eq("author_id", author_id);
        }
        if options.sort == ThreadSort::Popular {
            query = query.order("score", false);
        }
        let query = query
            .order("created_at", false)
            .offset(options.offset)
            .limit(options.limit.unwrap_or(self.page_size));

        let threads: Vec<Thread> = select_all(self.data.as_ref(), &query).await?;
        debug!(count = threads.len(), sort = ?options.sort, "threads listed");
        self.enrich(threads).await
    }

    pub async fn get_thread(&self, id: &str) -> Result<ThreadView, DevPlayError> {
        let thread: Thread = select_one(self.data.as_ref(), &thread_by_id(id)).await?;
        self.enrich_one(thread).await
    }

    pub async fn update_thread(&self, id: &str, mut update: UpdateThread) -> Result<ThreadView, DevPlayError> {
        if let Some(content) = &update.content {
            update.content = Some(self.validate_content(content)?);
        }
        let thread: Thread = update_one(self.data.as_ref(), &thread_by_id(id), &update).await?;
        self.enrich_one(thread).await
    }

    pub async fn delete_thread(&self, id: &str) -> Result<(), DevPlayError> {
        if self.data.delete(&thread_by_id(id)).await? == 0 {
            return Err(DevPlayError::not_found("Thread", id));
        }
        info!(thread_id = %id, "thread deleted");
        Ok(())
    }

    // ---- Comments ----

    /// Live comments, oldest first, nested under their parents.
    ///
    /// A reply whose parent is missing (deleted or never visible) is dropped
    /// along with its own replies.
    pub async fn comments(&self, thread_id: &str) -> Result<Vec<CommentNode>, DevPlayError> {
        let query = Query::table(Table::Comments)
            .eq("thread_id", thread_id)
            .eq("is_deleted", false)
            .order("created_at", true);
        let comments: Vec<Comment> = select_all(self.data.as_ref(), &query).await?;
        let authors = self
            .profiles
            .summaries(comments.iter().map(|c| &c.author_id))
            .await?;

        let mut children: HashMap<String, Vec<Comment>> = HashMap::new();
        let mut roots = Vec::new();
        for comment in comments {
            match comment.parent_id.clone() {
                Some(parent) => children.entry(parent).or_default().push(comment),
                None => roots.push(comment),
            }
        }
        Ok(roots
            .into_iter()
            .map(|c| build_node(c, &mut children, &authors))
            .collect())
    }

    /// Non-deleted comments on `thread_id`.
    pub async fn comments_count(&self, thread_id: &str) -> Result<u64, DevPlayError> {
        let query = Query::table(Table::Comments)
            .eq("thread_id", thread_id)
            .eq("is_deleted", false);
        self.data.count(&query).await
    }

    pub async fn create_comment(&self, input: CreateComment) -> Result<CommentNode, DevPlayError> {
        validate_required(&input.content, "댓글")?;
        let author = self.current.profile().await?;
        let row = json!({
            "thread_id": input.thread_id,
            "author_id": author.id,
            "parent_id": input.parent_id,
            "content": input.content.trim(),
        });
        let stored = self.data.insert(Table::Comments, row).await?;
        let comment: Comment = decode_row(Table::Comments, stored)?;
        debug!(comment_id = %comment.id, thread_id = %comment.thread_id, "comment created");
        Ok(CommentNode {
            comment,
            author: Some((&author).into()),
            replies: Vec::new(),
        })
    }

    pub async fn update_comment(&self, id: &str, content: &str) -> Result<Comment, DevPlayError> {
        validate_required(content, "댓글")?;
        let patch = json!({ "content": content.trim(), "is_edited": true });
        update_one(self.data.as_ref(), &comment_by_id(id), &patch).await
    }

    /// Soft delete: the row stays, its text is replaced.
    pub async fn delete_comment(&self, id: &str) -> Result<Comment, DevPlayError> {
        let patch = json!({ "is_deleted": true, "content": DELETED_COMMENT_TEXT });
        update_one(self.data.as_ref(), &comment_by_id(id), &patch).await
    }

    // ---- Reactions ----

    /// Adds the caller's reaction of `kind`, or removes it if present.
    ///
    /// Returns the new reaction, or `None` when it was removed.
    pub async fn toggle_reaction(
        &self,
        thread_id: &str,
        kind: ReactionType,
    ) -> Result<Option<Reaction>, DevPlayError> {
        let user_id = self.current.profile_id().await?;
        let existing_query = Query::table(Table::Reactions)
            .eq("thread_id", thread_id)
            .eq("user_id", &user_id)
            .eq("type", kind.to_string());
        let existing: Option<Reaction> = select_maybe(self.data.as_ref(), &existing_query).await?;

        if let Some(reaction) = existing {
            self.data
                .delete(&Query::table(Table::Reactions).eq("id", reaction.id.as_str()))
                .await?;
            debug!(thread_id, %kind, "reaction removed");
            return Ok(None);
        }

        let row = json!({ "thread_id": thread_id, "user_id": user_id, "type": kind });
        let created: Reaction = insert_as(self.data.as_ref(), Table::Reactions, &row).await?;
        debug!(thread_id, %kind, "reaction added");
        Ok(Some(created))
    }

    /// Reaction totals per kind on `thread_id`.
    pub async fn reaction_counts(&self, thread_id: &str) -> Result<ReactionCounts, DevPlayError> {
        let rows = self
            .data
            .select(&Query::table(Table::Reactions).eq("thread_id", thread_id))
            .await?;
        let mut counts = ReactionCounts::default();
        for kind in rows.iter().filter_map(reaction_kind) {
            counts.add(kind);
        }
        Ok(counts)
    }

    /// The viewer's earliest reaction on the thread; `None` when logged out.
    pub async fn viewer_reaction(&self, thread_id: &str) -> Result<Option<ReactionType>, DevPlayError> {
        match self.current.viewer_id().await? {
            Some(viewer) => self.reaction_of(thread_id, &viewer).await,
            None => Ok(None),
        }
    }

    async fn reaction_of(
        &self,
        thread_id: &str,
        viewer: &ProfileId,
    ) -> Result<Option<ReactionType>, DevPlayError> {
        let query = Query::table(Table::Reactions)
            .eq("thread_id", thread_id)
            .eq("user_id", viewer)
            .order("created_at", true)
            .limit(1);
        let rows = self.data.select(&query).await?;
        Ok(rows.first().and_then(reaction_kind))
    }

    // ---- Enrichment ----

    async fn enrich_one(&self, thread: Thread) -> Result<ThreadView, DevPlayError> {
        let mut views = self.enrich(vec![thread]).await?;
        views
            .pop()
            .ok_or_else(|| DevPlayError::Internal("thread enrichment dropped a row".into()))
    }

    async fn enrich(&self, threads: Vec<Thread>) -> Result<Vec<ThreadView>, DevPlayError> {
        if threads.is_empty() {
            return Ok(Vec::new());
        }
        let authors = self
            .profiles
            .summaries(threads.iter().map(|t| &t.author_id))
            .await?;
        let software = self.software_refs(&threads).await?;
        let viewer = self.current.viewer_id().await?;

        let stats = threads.iter().map(|t| {
            let viewer = viewer.as_ref();
            async move {
                let comments = self.comments_count(&t.id).await?;
                let reactions = self.reaction_counts(&t.id).await?;
                let mine = match viewer {
                    Some(v) => self.reaction_of(&t.id, v).await?,
                    None => None,
                };
                Ok::<_, DevPlayError>((comments, reactions, mine))
            }
        });
        let stats = try_join_all(stats).await?;

        Ok(threads
            .into_iter()
            .zip(stats)
            .map(|(thread, (comments_count, reactions, viewer_reaction))| ThreadView {
                author: authors.get(&thread.author_id).cloned(),
                software: thread
                    .software_id
                    .as_ref()
                    .and_then(|id| software.get(id).cloned()),
                thread,
                comments_count,
                reactions,
                viewer_reaction,
            })
            .collect())
    }

    async fn software_refs(&self, threads: &[Thread]) -> Result<HashMap<String, SoftwareRef>, DevPlayError> {
        let mut ids: Vec<&str> = threads
            .iter()
            .filter_map(|t| t.software_id.as_deref())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = Query::table(Table::Softwares).in_list("id", ids);
        let refs: Vec<SoftwareRef> = select_all(self.data.as_ref(), &query).await?;
        Ok(refs.into_iter().map(|s| (s.id.clone(), s)).collect())
    }
}

fn build_node(
    comment: Comment,
    children: &mut HashMap<String, Vec<Comment>>,
    authors: &HashMap<ProfileId, AuthorSummary>,
) -> CommentNode {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|c| build_node(c, children, authors))
        .collect();
    CommentNode {
        author: authors.get(&comment.author_id).cloned(),
        comment,
        replies,
    }
}

fn reaction_kind(row: &Value) -> Option<ReactionType> {
    row.get("type")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

fn thread_by_id(id: &str) -> Query {
    Query::table(Table::Threads).eq("id", id)
}

fn comment_by_id(id: &str) -> Query {
    Query::table(Table::Comments).eq("id", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devplay_test_utils::fixtures::{FIXTURE_TIME, profile_row, session_for, software_row};
    use devplay_test_utils::{MemoryStore, MockIdentity};

    async fn service(signed_in: bool) -> (Arc<MemoryStore>, ThreadService) {
        let data = Arc::new(MemoryStore::new());
        data.seed(Table::Profiles, profile_row("u1", "alice", "user")).await;
        data.seed(Table::Profiles, profile_row("u2", "bob", "developer")).await;
        let identity = Arc::new(if signed_in {
            MockIdentity::with_session(session_for("u1"))
        } else {
            MockIdentity::new()
        });
        let svc = ThreadService::new(identity, data.clone(), &ForumConfig::default());
        (data, svc)
    }

    fn thread_row(id: &str, author: &str, score: i64, created_at: &str) -> Value {
        json!({
            "id": id,
            "author_id": author,
            "software_id": null,
            "content": format!("thread {id}"),
            "media_urls": null,
            "score": score,
            "created_at": created_at,
            "updated_at": created_at,
        })
    }

    fn comment_row(id: &str, parent: Option<&str>, at: &str, deleted: bool) -> Value {
        json!({
            "id": id,
            "thread_id": "t1",
            "author_id": "p-u2",
            "parent_id": parent,
            "content": format!("comment {id}"),
            "is_edited": false,
            "is_deleted": deleted,
            "created_at": at,
            "updated_at": at,
        })
    }

    #[tokio::test]
    async fn create_thread_trims_and_enforces_length() {
        let (data, svc) = service(true).await;
        data.seed(Table::Softwares, software_row("s1", "p-u2", "Snake")).await;

        let view = svc
            .create_thread(CreateThread {
                content: "  first post  ".into(),
                software_id: Some("s1".into()),
                media_urls: None,
            })
            .await
            .unwrap();
        assert_eq!(view.thread.content, "first post");
        assert_eq!(view.author.unwrap().username, "alice");
        assert_eq!(view.software.unwrap().name, "Snake");
        assert_eq!(view.comments_count, 0);

        let err = svc
            .create_thread(CreateThread {
                content: "x".repeat(501),
                ..CreateThread::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "내용은 500자 이하로 입력해주세요.");

        let err = svc.create_thread(CreateThread::default()).await.unwrap_err();
        assert_eq!(err.to_string(), MSG_CONTENT_REQUIRED);
    }

    #[tokio::test]
    async fn anonymous_cannot_post() {
        let (_data, svc) = service(false).await;
        let err = svc
            .create_thread(CreateThread {
                content: "hi".into(),
                ..CreateThread::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DevPlayError::NotAuthenticated));
    }

    #[tokio::test]
    async fn popular_sort_uses_score_then_recency() {
        let (data, svc) = service(false).await;
        data.seed(Table::Threads, thread_row("old-hot", "p-u1", 5, "2026-01-01T00:00:00Z")).await;
        data.seed(Table::Threads, thread_row("new-hot", "p-u1", 5, "2026-01-03T00:00:00Z")).await;
        data.seed(Table::Threads, thread_row("newest", "p-u2", 0, "2026-01-04T00:00:00Z")).await;

        let popular = svc
            .list_threads(&ThreadListOptions {
                sort: ThreadSort::Popular,
                ..ThreadListOptions::default()
            })
            .await
            .unwrap();
        let ids: Vec<_> = popular.iter().map(|v| v.thread.id.as_str()).collect();
        assert_eq!(ids, ["new-hot", "old-hot", "newest"]);

        let latest = svc
            .list_threads(&ThreadListOptions {
                limit: Some(1),
                ..ThreadListOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(latest[0].thread.id, "newest");
        assert!(latest[0].viewer_reaction.is_none());
    }

    #[tokio::test]
    async fn comments_form_a_tree_and_skip_deleted() {
        let (data, svc) = service(true).await;
        data.seed(Table::Threads, thread_row("t1", "p-u1", 0, FIXTURE_TIME)).await;
        data.seed(Table::Comments, comment_row("c1", None, "2026-01-01T00:00:01Z", false)).await;
        data.seed(Table::Comments, comment_row("c2", Some("c1"), "2026-01-01T00:00:02Z", false)).await;
        data.seed(Table::Comments, comment_row("c3", Some("c2"), "2026-01-01T00:00:03Z", false)).await;
        data.seed(Table::Comments, comment_row("gone", None, "2026-01-01T00:00:04Z", true)).await;
        data.seed(Table::Comments, comment_row("orphan", Some("gone"), "2026-01-01T00:00:05Z", false)).await;

        let tree = svc.comments("t1").await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment.id, "c1");
        assert_eq!(tree[0].replies[0].comment.id, "c2");
        assert_eq!(tree[0].replies[0].replies[0].comment.id, "c3");
        assert_eq!(tree[0].author.as_ref().unwrap().username, "bob");
        assert_eq!(svc.comments_count("t1").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn comment_edit_and_soft_delete() {
        let (_data, svc) = service(true).await;
        let node = svc
            .create_comment(CreateComment {
                thread_id: "t1".into(),
                content: "nice".into(),
                parent_id: None,
            })
            .await
            .unwrap();
        let id = node.comment.id.clone();

        let edited = svc.update_comment(&id, "nicer").await.unwrap();
        assert!(edited.is_edited);
        assert_eq!(edited.content, "nicer");

        let deleted = svc.delete_comment(&id).await.unwrap();
        assert!(deleted.is_deleted);
        assert_eq!(deleted.content, DELETED_COMMENT_TEXT);
        assert!(svc.comments("t1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reactions_toggle_and_count() {
        let (data, svc) = service(true).await;
        data.seed(Table::Threads, thread_row("t1", "p-u2", 0, FIXTURE_TIME)).await;

        let added = svc.toggle_reaction("t1", ReactionType::Cheer).await.unwrap();
        assert_eq!(added.unwrap().kind, ReactionType::Cheer);
        svc.toggle_reaction("t1", ReactionType::Bug).await.unwrap();

        let counts = svc.reaction_counts("t1").await.unwrap();
        assert_eq!((counts.cheer, counts.bug, counts.total()), (1, 1, 2));
        assert_eq!(
            svc.viewer_reaction("t1").await.unwrap(),
            Some(ReactionType::Cheer)
        );

        assert!(svc.toggle_reaction("t1", ReactionType::Cheer).await.unwrap().is_none());
        let view = svc.get_thread("t1").await.unwrap();
        assert_eq!(view.reactions.cheer, 0);
        assert_eq!(view.viewer_reaction, Some(ReactionType::Bug));
    }
}
