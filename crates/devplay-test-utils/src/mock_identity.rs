// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock identity provider for deterministic testing.
//!
//! `MockIdentity` holds an optional session, broadcasts auth events that
//! tests inject, and can be told to fail individual calls.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;

use devplay_core::traits::adapter::BackendAdapter;
use devplay_core::traits::identity::IdentityProvider;
use devplay_core::types::{AdapterType, AuthEvent, AuthUser, HealthStatus, OAuthProvider, Session};
use devplay_core::DevPlayError;

const EVENT_CAPACITY: usize = 64;

/// A scriptable identity provider.
pub struct MockIdentity {
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    get_session_error: Mutex<Option<DevPlayError>>,
    sign_in_error: Mutex<Option<DevPlayError>>,
    sign_out_error: Mutex<Option<DevPlayError>>,
    get_session_calls: AtomicUsize,
}

impl MockIdentity {
    /// No persisted session.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session: Mutex::new(None),
            events,
            get_session_error: Mutex::new(None),
            sign_in_error: Mutex::new(None),
            sign_out_error: Mutex::new(None),
            get_session_calls: AtomicUsize::new(0),
        }
    }

    /// A persisted session that `get_session` will restore.
    pub fn with_session(session: Session) -> Self {
        let mock = Self::new();
        *lock(&mock.session) = Some(session);
        mock
    }

    /// Broadcasts an event to every subscriber. No subscribers is fine.
    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    /// Replaces the session and emits `SignedIn`, as an OAuth callback would.
    pub fn sign_in(&self, session: Session) {
        *lock(&self.session) = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session));
    }

    /// The next `get_session` fails with `err`.
    pub fn fail_get_session(&self, err: DevPlayError) {
        *lock(&self.get_session_error) = Some(err);
    }

    /// The next `sign_in_with_oauth` fails with `err`.
    pub fn fail_sign_in(&self, err: DevPlayError) {
        *lock(&self.sign_in_error) = Some(err);
    }

    /// The next `sign_out` fails with `err`.
    pub fn fail_sign_out(&self, err: DevPlayError) {
        *lock(&self.sign_out_error) = Some(err);
    }

    pub fn get_session_calls(&self) -> usize {
        self.get_session_calls.load(Ordering::SeqCst)
    }

    /// Live subscriptions; zero once every listener has been torn down.
    pub fn receiver_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn current_session(&self) -> Option<Session> {
        lock(&self.session).clone()
    }
}

impl Default for MockIdentity {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl BackendAdapter for MockIdentity {
    fn name(&self) -> &str {
        "mock-identity"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, DevPlayError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn get_session(&self) -> Result<Option<Session>, DevPlayError> {
        self.get_session_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = lock(&self.get_session_error).take() {
            return Err(err);
        }
        Ok(self.current_session())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, DevPlayError> {
        if let Some(err) = lock(&self.sign_in_error).take() {
            return Err(err);
        }
        Ok(format!(
            "https://identity.mock/authorize?provider={provider}&redirect_to={redirect_to}"
        ))
    }

    async fn sign_out(&self) -> Result<(), DevPlayError> {
        if let Some(err) = lock(&self.sign_out_error).take() {
            return Err(err);
        }
        *lock(&self.session) = None;
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    async fn get_user(&self) -> Result<Option<AuthUser>, DevPlayError> {
        Ok(self.current_session().map(|s| s.user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::session_for;

    #[tokio::test]
    async fn restores_configured_session() {
        let mock = MockIdentity::with_session(session_for("u1"));
        let session = mock.get_session().await.unwrap().unwrap();
        assert_eq!(session.user.id.0, "u1");
        assert_eq!(mock.get_session_calls(), 1);
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let mock = MockIdentity::new();
        mock.fail_get_session(DevPlayError::NotAuthenticated);
        assert!(mock.get_session().await.is_err());
        assert!(mock.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sign_out_emits_event() {
        let mock = MockIdentity::with_session(session_for("u1"));
        let mut rx = mock.subscribe();
        mock.sign_out().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::SignedOut);
        assert!(mock.current_session().is_none());
    }

    #[test]
    fn receiver_count_tracks_subscriptions() {
        let mock = MockIdentity::new();
        let rx = mock.subscribe();
        assert_eq!(mock.receiver_count(), 1);
        drop(rx);
        assert_eq!(mock.receiver_count(), 0);
    }
}
