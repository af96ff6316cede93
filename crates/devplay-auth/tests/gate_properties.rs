// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end gating behaviour over the mock identity provider and store.
//!
//! Each test starts an isolated `TestApp`; none share state.

use std::time::Duration;

use devplay_auth::{GateState, GateView};
use devplay_core::{AuthEvent, Role, Table, UserId};
use devplay_test_utils::TestApp;
use devplay_test_utils::fixtures::{profile_row, session_for};
use tracing_test::traced_test;

// ---- Fresh start ----

#[tokio::test]
async fn fresh_storage_is_ready_and_logged_out() {
    let app = TestApp::builder().build().await.unwrap();

    assert_eq!(app.gate_state(), GateState::Ready);
    assert_eq!(
        app.view(),
        GateView::App {
            viewer: None,
            login_visible: true
        }
    );
    app.shutdown().await;
}

#[tokio::test]
async fn restored_session_with_profile_shows_username() {
    let app = TestApp::builder()
        .with_session("u1")
        .with_profile("u1", "alice", Role::User)
        .build()
        .await
        .unwrap();

    match app.view() {
        GateView::App {
            viewer: Some(viewer),
            login_visible,
        } => {
            assert_eq!(viewer.username, "alice");
            assert!(!login_visible);
        }
        other => panic!("expected app with viewer, got {other:?}"),
    }
    app.shutdown().await;
}

// ---- Nickname setup ----

#[tokio::test]
async fn session_without_profile_needs_setup() {
    let app = TestApp::builder().with_session("u1").build().await.unwrap();

    assert_eq!(app.gate_state(), GateState::NeedsSetup);
    assert_eq!(
        app.view(),
        GateView::NicknameForm {
            user_id: UserId::from("u1")
        }
    );
    app.shutdown().await;
}

#[tokio::test]
async fn nickname_submission_creates_one_profile_and_unblocks() {
    let app = TestApp::builder().with_session("u1").build().await.unwrap();

    let profile = app.runtime.nickname.submit("bob").await.unwrap();

    assert_eq!(profile.user_id, UserId::from("u1"));
    assert_eq!(profile.username, "bob");
    assert_eq!(profile.role, Role::User);
    assert_eq!(app.profile_count().await, 1);
    assert_eq!(app.gate_state(), GateState::Ready);
    assert_eq!(app.snapshot().profile.unwrap().username, "bob");
    app.shutdown().await;
}

#[tokio::test]
async fn taken_nickname_is_rejected_inline() {
    let app = TestApp::builder()
        .with_session("u1")
        .with_profile("u2", "bob", Role::User)
        .build()
        .await
        .unwrap();

    let err = app.runtime.nickname.submit("bob").await.unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.to_string(), "이미 사용 중인 닉네임입니다");
    assert_eq!(app.profile_count().await, 1);
    assert_eq!(app.gate_state(), GateState::NeedsSetup);
    app.shutdown().await;
}

#[tokio::test]
async fn no_profile_session_never_reaches_app() {
    let app = TestApp::builder().with_session("u1").build().await.unwrap();

    app.emit(AuthEvent::TokenRefreshed(session_for("u1"))).await;
    assert_eq!(app.gate_state(), GateState::NeedsSetup);

    app.emit(AuthEvent::SignedIn(session_for("u1"))).await;
    assert_eq!(app.gate_state(), GateState::NeedsSetup);
    app.shutdown().await;
}

// ---- Sign-out ----

#[tokio::test]
async fn sign_out_from_needs_setup_returns_to_logged_out() {
    let app = TestApp::builder().with_session("u1").build().await.unwrap();
    assert_eq!(app.gate_state(), GateState::NeedsSetup);

    app.emit(AuthEvent::SignedOut).await;

    let snap = app.snapshot();
    assert!(snap.session.is_none());
    assert!(snap.profile.is_none());
    assert_eq!(app.gate_state(), GateState::Ready);
    app.shutdown().await;
}

#[tokio::test]
async fn sign_out_while_resolving_drops_the_late_profile() {
    let app = TestApp::builder()
        .with_profile("u1", "alice", Role::User)
        .build()
        .await
        .unwrap();
    app.data
        .delay_select(Table::Profiles, "user_id", "u1", Duration::from_millis(80))
        .await;

    app.identity.emit(AuthEvent::SignedIn(session_for("u1")));
    tokio::task::yield_now().await;
    app.emit(AuthEvent::SignedOut).await;

    let snap = app.snapshot();
    assert!(snap.session.is_none());
    assert!(snap.profile.is_none());
    assert_eq!(app.gate_state(), GateState::Ready);
    app.shutdown().await;
}

#[tokio::test]
async fn sign_out_during_nickname_submit_stays_signed_out() {
    let app = TestApp::builder().with_session("u1").build().await.unwrap();
    app.data
        .delay_select(Table::Profiles, "username", "bob", Duration::from_millis(80))
        .await;

    let sign_out = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        app.emit(AuthEvent::SignedOut).await;
    };
    let (submitted, ()) = tokio::join!(app.runtime.nickname.submit("bob"), sign_out);

    assert_eq!(submitted.unwrap().username, "bob");
    let snap = app.snapshot();
    assert!(snap.session.is_none());
    assert!(snap.profile.is_none());
    assert_eq!(app.gate_state(), GateState::Ready);
    app.shutdown().await;
}

#[tokio::test]
async fn account_switch_during_nickname_submit_keeps_new_user_in_setup() {
    let app = TestApp::builder().with_session("u1").build().await.unwrap();
    app.data
        .delay_select(Table::Profiles, "username", "bob", Duration::from_millis(80))
        .await;

    let switch = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        app.sign_in("u2").await;
    };
    let (submitted, ()) = tokio::join!(app.runtime.nickname.submit("bob"), switch);

    assert_eq!(submitted.unwrap().user_id, UserId::from("u1"));
    let snap = app.snapshot();
    assert_eq!(snap.user_id(), Some(&UserId::from("u2")));
    assert!(snap.profile.is_none());
    assert_eq!(
        app.view(),
        GateView::NicknameForm {
            user_id: UserId::from("u2")
        }
    );
    app.shutdown().await;
}

// ---- Concurrent sign-ins ----

#[tokio::test]
#[traced_test]
async fn later_sign_in_wins_over_slower_earlier_one() {
    let app = TestApp::builder().build().await.unwrap();
    app.data.seed(Table::Profiles, profile_row("u1", "alice", "user")).await;
    app.data.seed(Table::Profiles, profile_row("u2", "bob", "user")).await;
    app.data
        .delay_select(Table::Profiles, "user_id", "u1", Duration::from_millis(100))
        .await;

    app.identity.emit(AuthEvent::SignedIn(session_for("u1")));
    app.identity.emit(AuthEvent::SignedIn(session_for("u2")));
    app.settle().await;

    let snap = app.snapshot();
    assert_eq!(snap.user_id(), Some(&UserId::from("u2")));
    assert_eq!(snap.profile.unwrap().username, "bob");
    assert!(logs_contain("discarding stale resolution"));
    app.shutdown().await;
}

#[tokio::test]
async fn sign_in_after_logged_out_start_resolves_profile() {
    let app = TestApp::builder()
        .with_profile("u1", "alice", Role::Developer)
        .build()
        .await
        .unwrap();

    app.sign_in("u1").await;

    assert_eq!(app.gate_state(), GateState::Ready);
    assert_eq!(app.snapshot().profile.unwrap().role, Role::Developer);
    app.shutdown().await;
}

// ---- Failure handling ----

#[tokio::test]
async fn missing_profiles_table_surfaces_error_and_leaves_loading() {
    let app = TestApp::builder().build().await.unwrap();
    app.data.drop_table(Table::Profiles);

    app.sign_in("u1").await;

    let snap = app.snapshot();
    assert!(!snap.is_loading);
    assert!(snap.error.is_some());
    assert_eq!(app.gate_state(), GateState::Ready);
    app.shutdown().await;
}

#[tokio::test]
async fn shutdown_releases_the_subscription() {
    let app = TestApp::builder().build().await.unwrap();
    assert_eq!(app.identity.receiver_count(), 1);
    let identity = app.identity.clone();

    app.shutdown().await;

    assert_eq!(identity.receiver_count(), 0);
}
