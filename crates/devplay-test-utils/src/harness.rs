// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end harness for the auth stack.
//!
//! `TestApp` starts a full [`AuthRuntime`] on top of [`MockIdentity`] and
//! [`MemoryStore`], so tests can drive auth events and observe the gate.

use std::sync::Arc;

use devplay_auth::{AuthRuntime, AuthSnapshot, GateState, GateView};
use devplay_config::DevPlayConfig;
use devplay_core::{AuthEvent, DevPlayError, Role, Session, Table};

use crate::fixtures::{profile_row, session_for};
use crate::memory_store::MemoryStore;
use crate::mock_identity::MockIdentity;

/// Builder for [`TestApp`].
pub struct TestAppBuilder {
    session: Option<Session>,
    profiles: Vec<(String, String, Role)>,
    config: DevPlayConfig,
    enforce_unique: bool,
}

impl TestAppBuilder {
    fn new() -> Self {
        Self {
            session: None,
            profiles: Vec::new(),
            config: DevPlayConfig::default(),
            enforce_unique: true,
        }
    }

    /// Starts with a persisted session for `uid`.
    pub fn with_session(mut self, uid: &str) -> Self {
        self.session = Some(session_for(uid));
        self
    }

    /// Seeds an existing profile.
    pub fn with_profile(mut self, uid: &str, username: &str, role: Role) -> Self {
        self.profiles
            .push((uid.to_string(), username.to_string(), role));
        self
    }

    pub fn with_config(mut self, config: DevPlayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn without_constraints(mut self) -> Self {
        self.enforce_unique = false;
        self
    }

    /// Seeds the store and starts the runtime; bootstrap has finished on return.
    pub async fn build(self) -> Result<TestApp, DevPlayError> {
        let temp_dir = tempfile::TempDir::new()
            .map_err(|e| DevPlayError::Internal(format!("temp dir: {e}")))?;
        let mut config = self.config;
        config.auth.session_path = temp_dir
            .path()
            .join("session.json")
            .to_string_lossy()
            .into_owned();

        let identity = Arc::new(match self.session {
            Some(session) => MockIdentity::with_session(session),
            None => MockIdentity::new(),
        });
        let data = Arc::new(if self.enforce_unique {
            MemoryStore::new()
        } else {
            MemoryStore::new().without_constraints()
        });
        for (uid, username, role) in &self.profiles {
            data.seed(Table::Profiles, profile_row(uid, username, &role.to_string()))
                .await;
        }

        let runtime = AuthRuntime::start(identity.clone(), data.clone(), &config).await;
        Ok(TestApp {
            identity,
            data,
            runtime,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A running auth stack with handles to its mocks.
pub struct TestApp {
    pub identity: Arc<MockIdentity>,
    pub data: Arc<MemoryStore>,
    pub runtime: AuthRuntime,
    pub config: DevPlayConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::new()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.runtime.store().snapshot()
    }

    pub fn gate_state(&self) -> GateState {
        self.runtime.gate().state()
    }

    pub fn view(&self) -> GateView {
        self.runtime.gate().render()
    }

    /// Emits `event` and waits for the listener to handle it and any
    /// resolution it deferred.
    pub async fn emit(&self, event: AuthEvent) {
        self.identity.emit(event);
        self.settle().await;
    }

    /// Signs `uid` in through the identity provider and settles.
    pub async fn sign_in(&self, uid: &str) {
        self.identity.sign_in(session_for(uid));
        self.settle().await;
    }

    pub async fn settle(&self) {
        // Let the listener task pick up queued events before draining.
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        self.runtime.listener.settle().await;
    }

    pub async fn profile_count(&self) -> usize {
        self.data.rows(Table::Profiles).await.len()
    }

    pub async fn shutdown(self) {
        self.runtime.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_app_is_ready_and_logged_out() {
        let app = TestApp::builder().build().await.unwrap();
        assert_eq!(app.gate_state(), GateState::Ready);
        assert!(app.snapshot().session.is_none());
        app.shutdown().await;
    }

    #[tokio::test]
    async fn seeded_profile_is_resolved() {
        let app = TestApp::builder()
            .with_session("u1")
            .with_profile("u1", "alice", Role::Developer)
            .build()
            .await
            .unwrap();
        let profile = app.snapshot().profile.unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.role, Role::Developer);
        app.shutdown().await;
    }
}
