// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `devplay status` command implementation.
//!
//! Restores the session, waits for the gate to settle and reports what the
//! application would render, plus the health of both backend adapters.

use std::io::IsTerminal;

use devplay_auth::{GateState, GateView};
use devplay_core::{DevPlayError, HealthStatus};
use serde::Serialize;

use crate::context::Context;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub gate: GateState,
    #[serde(flatten)]
    pub view: GateView,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub error: Option<String>,
    pub identity: String,
    pub data: String,
}

fn health_label(result: Result<HealthStatus, DevPlayError>) -> String {
    match result {
        Ok(HealthStatus::Healthy) => "healthy".to_string(),
        Ok(HealthStatus::Degraded(why)) => format!("degraded: {why}"),
        Ok(HealthStatus::Unhealthy(why)) => format!("unhealthy: {why}"),
        Err(e) => format!("unhealthy: {e}"),
    }
}

pub async fn collect_status(ctx: &Context) -> Result<StatusResponse, DevPlayError> {
    let gate = ctx.settled().await?;
    let snapshot = ctx.runtime.store().snapshot();
    let user = snapshot.session.as_ref().map(|s| &s.user);

    Ok(StatusResponse {
        gate,
        view: GateView::from_snapshot(&snapshot),
        user_id: user.map(|u| u.id.to_string()),
        email: user.and_then(|u| u.email.clone()),
        error: snapshot.error.clone(),
        identity: health_label(ctx.identity.health_check().await),
        data: health_label(ctx.data.health_check().await),
    })
}

/// Run the `devplay status` command.
pub async fn run_status(ctx: &Context, json: bool, plain: bool) -> Result<(), DevPlayError> {
    let status = collect_status(ctx).await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&status, use_color);
    }
    Ok(())
}

fn print_status(status: &StatusResponse, use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  devplay status");
    println!("  {}", "-".repeat(35));

    let view = match &status.view {
        GateView::Spinner => "loading".to_string(),
        GateView::NicknameForm { .. } => "nickname setup required".to_string(),
        GateView::App {
            viewer: Some(viewer),
            ..
        } => format!("signed in as {} ({})", viewer.username, viewer.role.label()),
        GateView::App { viewer: None, .. } if status.user_id.is_some() => {
            "signed in, profile unavailable".to_string()
        }
        GateView::App { .. } => "logged out".to_string(),
    };
    if use_color {
        let marker = match status.gate {
            GateState::Ready => "✓".green(),
            GateState::NeedsSetup => "!".yellow(),
            GateState::Loading => "…".normal(),
        };
        println!("    Session:  {marker} {view}");
    } else {
        println!("    Session:  [{}] {view}", status.gate);
    }
    if let Some(email) = &status.email {
        println!("    Email:    {email}");
    }
    if let Some(error) = &status.error {
        if use_color {
            println!("    Error:    {}", error.red());
        } else {
            println!("    Error:    {error}");
        }
    }
    println!("    Identity: {}", status.identity);
    println!("    Data:     {}", status.data);
    println!();

    if status.gate == GateState::NeedsSetup {
        println!("  Choose a nickname with: devplay setup <nickname>");
        println!();
    } else if status.user_id.is_none() {
        println!("  Sign in with: devplay login <google|github>");
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use devplay_config::DevPlayConfig;
    use devplay_core::{Role, Table};
    use devplay_test_utils::fixtures::{profile_row, session_for};
    use devplay_test_utils::{MemoryStore, MockIdentity};

    async fn context(identity: MockIdentity, data: MemoryStore) -> Context {
        Context::start(
            DevPlayConfig::default(),
            Arc::new(identity),
            Arc::new(data),
            None,
        )
        .await
    }

    #[tokio::test]
    async fn logged_out_status() {
        let ctx = context(MockIdentity::new(), MemoryStore::new()).await;
        let status = collect_status(&ctx).await.unwrap();
        assert_eq!(status.gate, GateState::Ready);
        assert!(status.user_id.is_none());
        assert_eq!(status.identity, "healthy");

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["gate"], "ready");
        assert_eq!(json["view"], "app");
        assert_eq!(json["login_visible"], true);
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn signed_in_status_shows_viewer() {
        let data = MemoryStore::new();
        data.seed(Table::Profiles, profile_row("u1", "alice", "developer"))
            .await;
        let ctx = context(MockIdentity::with_session(session_for("u1")), data).await;

        let status = collect_status(&ctx).await.unwrap();
        match &status.view {
            GateView::App {
                viewer: Some(viewer),
                login_visible,
            } => {
                assert_eq!(viewer.username, "alice");
                assert_eq!(viewer.role, Role::Developer);
                assert!(!login_visible);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(status.email.as_deref(), Some("u1@example.com"));
        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn profileless_session_needs_setup() {
        let ctx = context(MockIdentity::with_session(session_for("u2")), MemoryStore::new()).await;
        let status = collect_status(&ctx).await.unwrap();
        assert_eq!(status.gate, GateState::NeedsSetup);
        assert!(matches!(status.view, GateView::NicknameForm { .. }));
        ctx.shutdown().await;
    }
}
