// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feeds identity-provider auth events into the store and orchestrator.
//!
//! The event handler never awaits the identity subsystem or the data
//! subsystem. Work that needs either (profile resolution) is spawned onto a
//! [`TaskTracker`] and runs after the handler returns. Dropping or shutting
//! down the [`ListenerHandle`] cancels the subscription; deferred work that
//! finishes afterwards is discarded.

use std::sync::Arc;

use devplay_core::{AuthEvent, IdentityProvider};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::bootstrap::BootstrapOrchestrator;

/// Spawns the auth event loop.
pub struct AuthEventListener;

impl AuthEventListener {
    /// Subscribes to `identity` and starts handling events on the current runtime.
    pub fn spawn(
        identity: &dyn IdentityProvider,
        orchestrator: Arc<BootstrapOrchestrator>,
    ) -> ListenerHandle {
        let rx = identity.subscribe();
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();

        let task = tokio::spawn(run(rx, orchestrator, token.clone(), tracker.clone()));
        ListenerHandle {
            token,
            tracker,
            task: Some(task),
        }
    }
}

/// Owns the listener's lifetime.
pub struct ListenerHandle {
    token: CancellationToken,
    tracker: TaskTracker,
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Token observed by the event loop and all deferred work.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Waits until every deferred resolution spawned so far has finished.
    pub async fn settle(&self) {
        // Close/reopen lets `wait` return while still accepting new work.
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Cancels the subscription and waits for deferred work to drain.
    ///
    /// In-flight backend requests are not aborted; their results are dropped.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "auth listener task ended abnormally");
        }
        self.tracker.close();
        self.tracker.wait().await;
        debug!("auth listener shut down");
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(
    mut rx: broadcast::Receiver<AuthEvent>,
    orchestrator: Arc<BootstrapOrchestrator>,
    token: CancellationToken,
    tracker: TaskTracker,
) {
    loop {
        let event = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            received = rx.recv() => received,
        };

        match event {
            Ok(event) => handle_event(event, &orchestrator, &token, &tracker),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "auth event receiver lagged, continuing");
            }
            Err(RecvError::Closed) => {
                debug!("identity provider closed the event channel");
                break;
            }
        }
    }
    // Dropping `rx` here releases the subscription.
}

/// Handles one event synchronously, deferring anything that needs I/O.
fn handle_event(
    event: AuthEvent,
    orchestrator: &Arc<BootstrapOrchestrator>,
    token: &CancellationToken,
    tracker: &TaskTracker,
) {
    let kind = event.kind();
    debug!(event = kind, "auth event received");

    match event {
        AuthEvent::SignedOut => {
            orchestrator.sign_out_observed();
        }
        AuthEvent::SignedIn(session) | AuthEvent::InitialSession(Some(session)) => {
            let generation = orchestrator.begin_sign_in(session.clone());
            let orchestrator = Arc::clone(orchestrator);
            let token = token.clone();
            tracker.spawn(async move {
                let outcome = orchestrator.resolve_for(session, generation, &token).await;
                debug!(event = kind, generation, ?outcome, "deferred resolution finished");
            });
        }
        AuthEvent::InitialSession(None) => {
            let store = orchestrator.store();
            if !store.snapshot().is_loading {
                orchestrator.advance();
                store.clear();
                info!("initial session empty, recorded logged-out state");
            }
        }
        AuthEvent::TokenRefreshed(session) | AuthEvent::UserUpdated(session) => {
            orchestrator.store().set_session(Some(session));
        }
    }
}
