// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog, forum and role request commands.

use devplay_api::validation::truncate_text;
use devplay_api::{
    RoleRequestService, SoftwareFilter, SoftwareService, ThreadListOptions, ThreadService,
    ThreadSort,
};
use devplay_auth::Access;
use devplay_core::models::{RoleRequest, SoftwareWithDeveloper, ThreadView};
use devplay_core::{DevPlayError, Role};

use crate::context::Context;

const PREVIEW_CHARS: usize = 60;

fn software_line(item: &SoftwareWithDeveloper) -> String {
    let developer = item
        .developer
        .as_ref()
        .map(|d| d.username.as_str())
        .unwrap_or("unknown");
    let tags = item
        .software
        .tags
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| format!(" [{}]", t.join(", ")))
        .unwrap_or_default();
    format!(
        "{}  {} ({}) by {developer}{tags}",
        item.software.id, item.software.name, item.software.category
    )
}

fn thread_line(view: &ThreadView) -> String {
    let author = view
        .author
        .as_ref()
        .map(|a| a.username.as_str())
        .unwrap_or("unknown");
    let r = &view.reactions;
    format!(
        "{}  {author}: {}  (score {}, {} comments, 👍{} 🎉{} 🐛{} 💡{})",
        view.thread.id,
        truncate_text(&view.thread.content.replace('\n', " "), PREVIEW_CHARS, "..."),
        view.thread.score,
        view.comments_count,
        r.like,
        r.cheer,
        r.bug,
        r.suggestion
    )
}

fn request_line(request: &RoleRequest) -> String {
    let reason = request.reason.as_deref().unwrap_or("-");
    format!(
        "{}  {} -> {}  [{}]  {}  ({})",
        request.id,
        request.user_id,
        request.requested_role,
        request.status,
        reason,
        request.created_at.format("%Y-%m-%d %H:%M")
    )
}

/// Fails unless the settled session holds at least `required`.
async fn require(ctx: &Context, required: Role) -> Result<(), DevPlayError> {
    ctx.settled().await?;
    let decision = Access::check(&ctx.runtime.store().snapshot(), required);
    if decision.is_granted() {
        return Ok(());
    }
    match decision.message() {
        Some(message) => Err(DevPlayError::PermissionDenied { message }),
        None => Err(DevPlayError::NotAuthenticated),
    }
}

pub async fn list_software(
    ctx: &Context,
    category: Option<String>,
    search: Option<String>,
) -> Result<(), DevPlayError> {
    let service = SoftwareService::new(ctx.identity.clone(), ctx.data.clone());
    let filter = SoftwareFilter {
        category,
        search,
        ..SoftwareFilter::default()
    };
    let items = service.list(&filter).await?;
    if items.is_empty() {
        println!("No software found.");
    }
    for item in &items {
        println!("{}", software_line(item));
    }
    Ok(())
}

pub async fn list_threads(ctx: &Context, popular: bool) -> Result<(), DevPlayError> {
    ctx.settled().await?;
    let service = ThreadService::new(ctx.identity.clone(), ctx.data.clone(), &ctx.config.forum);
    let options = ThreadListOptions {
        sort: if popular {
            ThreadSort::Popular
        } else {
            ThreadSort::Latest
        },
        ..ThreadListOptions::default()
    };
    let threads = service.list_threads(&options).await?;
    if threads.is_empty() {
        println!("No threads yet.");
    }
    for view in &threads {
        println!("{}", thread_line(view));
    }
    Ok(())
}

pub async fn request_role(
    ctx: &Context,
    role: Role,
    reason: Option<&str>,
) -> Result<(), DevPlayError> {
    require(ctx, Role::User).await?;
    let service = RoleRequestService::new(ctx.identity.clone(), ctx.data.clone());
    let request = service.create(role, reason).await?;
    println!("Requested {} (request {}).", request.requested_role, request.id);
    Ok(())
}

pub async fn pending_requests(ctx: &Context) -> Result<(), DevPlayError> {
    require(ctx, Role::Admin).await?;
    let service = RoleRequestService::new(ctx.identity.clone(), ctx.data.clone());
    let pending = service.pending().await?;
    if pending.is_empty() {
        println!("No pending requests.");
    }
    for request in &pending {
        println!("{}", request_line(request));
    }
    Ok(())
}

pub async fn review_request(
    ctx: &Context,
    id: &str,
    approve: bool,
    notes: Option<&str>,
) -> Result<(), DevPlayError> {
    require(ctx, Role::Admin).await?;
    let service = RoleRequestService::new(ctx.identity.clone(), ctx.data.clone());
    let reviewed = if approve {
        service.approve(id, notes).await?
    } else {
        service.reject(id, notes).await?
    };
    println!("Request {} is now {}.", reviewed.id, reviewed.status);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use devplay_config::DevPlayConfig;
    use devplay_core::Table;
    use devplay_core::models::RoleRequestStatus;
    use devplay_test_utils::fixtures::{profile_row, session_for, software_row};
    use devplay_test_utils::{MemoryStore, MockIdentity};

    async fn context(uid: &str, data: Arc<MemoryStore>) -> Context {
        Context::start(
            DevPlayConfig::default(),
            Arc::new(MockIdentity::with_session(session_for(uid))),
            data,
            None,
        )
        .await
    }

    async fn community() -> Arc<MemoryStore> {
        let data = Arc::new(MemoryStore::new());
        data.seed(Table::Profiles, profile_row("u1", "alice", "user")).await;
        data.seed(Table::Profiles, profile_row("root", "root", "admin")).await;
        data
    }

    #[tokio::test]
    async fn software_lines_name_developer_and_tags() {
        let data = community().await;
        data.seed(Table::Softwares, software_row("s1", "p-u1", "Rusty")).await;
        let service = SoftwareService::new(
            Arc::new(MockIdentity::new()),
            data.clone(),
        );
        let items = service.list(&SoftwareFilter::default()).await.unwrap();
        assert_eq!(software_line(&items[0]), "s1  Rusty (game) by alice [indie]");
    }

    #[tokio::test]
    async fn pending_requires_admin() {
        let data = community().await;
        let ctx = context("u1", data).await;
        let err = pending_requests(&ctx).await.unwrap_err();
        match err {
            DevPlayError::PermissionDenied { message } => assert!(message.contains("관리자")),
            other => panic!("unexpected {other:?}"),
        }
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn request_then_admin_approves() {
        let data = community().await;
        let user = context("u1", data.clone()).await;
        request_role(&user, Role::Developer, Some("shipping a game")).await.unwrap();
        let dup = request_role(&user, Role::Developer, None).await.unwrap_err();
        assert_eq!(dup.user_message(), devplay_api::role_requests::MSG_ALREADY_PENDING);
        user.shutdown().await;

        let admin = context("root", data.clone()).await;
        let pending = RoleRequestService::new(admin.identity.clone(), admin.data.clone())
            .pending()
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert!(request_line(&pending[0]).contains("-> developer"));

        review_request(&admin, &pending[0].id, true, Some("welcome")).await.unwrap();
        let rows = data.rows(Table::RoleRequests).await;
        assert_eq!(rows[0]["status"], RoleRequestStatus::Approved.to_string());
        admin.shutdown().await;
    }
}
