// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-service flows over one shared in-memory backend.

use std::sync::Arc;

use devplay_api::{
    CreateComment, CreateSoftware, CreateThread, CreateVersion, RoleRequestService,
    SoftwareFilter, SoftwareService, ThreadListOptions, ThreadService, VersionService,
};
use devplay_config::ForumConfig;
use devplay_core::models::ReactionType;
use devplay_core::{DataStore, IdentityProvider, Role};
use devplay_test_utils::fixtures::session_for;
use devplay_test_utils::{MockIdentity, TestApp};

fn as_user(uid: &str) -> Arc<dyn IdentityProvider> {
    Arc::new(MockIdentity::with_session(session_for(uid)))
}

#[tokio::test]
async fn developer_publishes_and_users_discuss() {
    let app = TestApp::builder()
        .with_session("dev")
        .with_profile("dev", "maker", Role::Developer)
        .with_profile("fan", "player", Role::User)
        .build()
        .await
        .unwrap();
    let data: Arc<dyn DataStore> = app.data.clone();

    let catalog = SoftwareService::new(app.identity.clone(), data.clone());
    let software = catalog
        .create(CreateSoftware {
            name: "Rogue Rust".into(),
            description: "dungeon crawler".into(),
            category: "game".into(),
            tags: Some(vec!["roguelike".into()]),
            download_url: "https://downloads.example.com/rogue.zip".into(),
            ..CreateSoftware::default()
        })
        .await
        .unwrap();

    let versions = VersionService::new(data.clone());
    versions
        .create(CreateVersion {
            software_id: software.software.id.clone(),
            version: "v0.1.0".into(),
            changelog: Some("first release".into()),
            download_url: "https://downloads.example.com/rogue-0.1.0.zip".into(),
            release_date: None,
        })
        .await
        .unwrap();
    let latest = versions.latest(&software.software.id).await.unwrap().unwrap();
    assert_eq!(latest.version, "v0.1.0");

    let forum = ThreadService::new(as_user("fan"), data.clone(), &ForumConfig::default());
    let thread = forum
        .create_thread(CreateThread {
            content: "Loving this game".into(),
            software_id: Some(software.software.id.clone()),
            media_urls: None,
        })
        .await
        .unwrap();
    forum
        .create_comment(CreateComment {
            thread_id: thread.thread.id.clone(),
            content: "same here".into(),
            parent_id: None,
        })
        .await
        .unwrap();
    forum
        .toggle_reaction(&thread.thread.id, ReactionType::Like)
        .await
        .unwrap();

    let listed = forum
        .list_threads(&ThreadListOptions {
            software_id: Some(software.software.id.clone()),
            ..ThreadListOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    let view = &listed[0];
    assert_eq!(view.author.as_ref().unwrap().username, "player");
    assert_eq!(view.software.as_ref().unwrap().name, "Rogue Rust");
    assert_eq!(view.comments_count, 1);
    assert_eq!(view.reactions.like, 1);
    assert_eq!(view.viewer_reaction, Some(ReactionType::Like));

    let search = catalog
        .list(&SoftwareFilter {
            search: Some("dungeon".into()),
            ..SoftwareFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(search[0].developer.as_ref().unwrap().username, "maker");
    app.shutdown().await;
}

#[tokio::test]
async fn approved_request_shows_up_after_profile_refresh() {
    let app = TestApp::builder()
        .with_session("u1")
        .with_profile("u1", "alice", Role::User)
        .with_profile("root", "admin", Role::Admin)
        .build()
        .await
        .unwrap();
    let data: Arc<dyn DataStore> = app.data.clone();

    let requests = RoleRequestService::new(app.identity.clone(), data.clone());
    let request = requests
        .create(Role::Developer, Some("publishing tools"))
        .await
        .unwrap();

    RoleRequestService::new(as_user("root"), data)
        .approve(&request.id, None)
        .await
        .unwrap();

    assert_eq!(app.snapshot().profile.unwrap().role, Role::User);
    app.runtime.actions.refresh_profile().await.unwrap();
    assert_eq!(app.snapshot().profile.unwrap().role, Role::Developer);
    app.shutdown().await;
}
