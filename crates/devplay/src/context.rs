// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by every subcommand.

use std::sync::Arc;

use devplay_auth::{AuthRuntime, GateState};
use devplay_config::DevPlayConfig;
use devplay_core::{DataStore, DevPlayError, IdentityProvider};
use devplay_supabase::SupabaseAuth;
use tracing::debug;

pub struct Context {
    pub config: DevPlayConfig,
    pub identity: Arc<dyn IdentityProvider>,
    pub data: Arc<dyn DataStore>,
    pub runtime: AuthRuntime,
    /// Present when connected to the hosted backend; completes OAuth callbacks.
    pub oauth: Option<Arc<SupabaseAuth>>,
}

impl Context {
    /// Connects to the configured backend and restores the session.
    pub async fn connect(config: DevPlayConfig) -> Result<Self, DevPlayError> {
        let backend = devplay_supabase::connect(&config)?;
        let oauth = backend.auth.clone();
        Ok(Self::start(config, backend.auth, backend.data, Some(oauth)).await)
    }

    pub async fn start(
        config: DevPlayConfig,
        identity: Arc<dyn IdentityProvider>,
        data: Arc<dyn DataStore>,
        oauth: Option<Arc<SupabaseAuth>>,
    ) -> Self {
        let runtime = AuthRuntime::start(identity.clone(), data.clone(), &config).await;
        Self {
            config,
            identity,
            data,
            runtime,
            oauth,
        }
    }

    /// Waits until the gate leaves `Loading` and deferred listener work is done.
    pub async fn settled(&self) -> Result<GateState, DevPlayError> {
        let mut gate = self.runtime.gate();
        gate.wait_until_settled().await?;
        self.runtime.listener.settle().await;
        let state = gate.wait_until_settled().await?;
        debug!(%state, "gate settled");
        Ok(state)
    }

    pub async fn shutdown(self) {
        self.runtime.shutdown().await;
    }
}
