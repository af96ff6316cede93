// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires store, orchestrator, listener, and gate into one running unit.

use std::sync::Arc;

use devplay_config::DevPlayConfig;
use devplay_core::{DataStore, IdentityProvider};
use tracing::info;

use crate::actions::AuthActions;
use crate::bootstrap::BootstrapOrchestrator;
use crate::gate::Gate;
use crate::listener::{AuthEventListener, ListenerHandle};
use crate::nickname::NicknameSetup;
use crate::resolver::ProfileResolver;
use crate::store::SessionStore;

/// A started auth stack.
///
/// The listener is subscribed before bootstrap runs, so no event emitted
/// during startup is missed.
pub struct AuthRuntime {
    /// Shared with the listener; owns the store.
    pub orchestrator: Arc<BootstrapOrchestrator>,
    /// Event subscription and deferred resolutions.
    pub listener: ListenerHandle,
    /// User-triggered auth actions.
    pub actions: AuthActions,
    /// First-login nickname form.
    pub nickname: NicknameSetup,
}

impl AuthRuntime {
    /// Subscribes to auth events and starts the bootstrap.
    pub async fn start(
        identity: Arc<dyn IdentityProvider>,
        data: Arc<dyn DataStore>,
        config: &DevPlayConfig,
    ) -> Self {
        let resolver = ProfileResolver::from_config(data.clone(), &config.auth);
        let orchestrator = BootstrapOrchestrator::shared(identity.clone(), resolver);
        let listener = AuthEventListener::spawn(identity.as_ref(), orchestrator.clone());

        let outcome = orchestrator.bootstrap().await;
        info!(?outcome, "auth runtime started");

        let actions = AuthActions::from_config(
            identity,
            data.clone(),
            orchestrator.clone(),
            config,
        );
        let nickname = NicknameSetup::new(data, orchestrator.clone());

        Self {
            orchestrator,
            listener,
            actions,
            nickname,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        self.orchestrator.store()
    }

    pub fn gate(&self) -> Gate {
        Gate::new(self.store())
    }

    /// Tears down the listener and waits for deferred work.
    pub async fn shutdown(self) {
        self.listener.shutdown().await;
    }
}
