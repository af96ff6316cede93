// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-initiated auth actions: sign in, sign out, edit and reload profile.
//!
//! Failures are recorded in the store's error field and also returned.

use std::sync::Arc;

use devplay_config::DevPlayConfig;
use devplay_core::traits::data::update_one;
use devplay_core::{
    AuthUser, DataStore, DevPlayError, IdentityProvider, OAuthProvider, Profile, Query, Table,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::bootstrap::BootstrapOrchestrator;
use crate::nickname::{ensure_nickname_free, validate_nickname};

/// Fields a user may change on their own profile. `None` leaves a field as is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    fn is_empty(&self) -> bool {
        self.username.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }
}

/// Auth actions the user triggers directly.
///
/// Profile results are committed through the orchestrator, so they never
/// outlive the session they were produced for.
pub struct AuthActions {
    identity: Arc<dyn IdentityProvider>,
    data: Arc<dyn DataStore>,
    orchestrator: Arc<BootstrapOrchestrator>,
    redirect_url: String,
}

impl AuthActions {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        data: Arc<dyn DataStore>,
        orchestrator: Arc<BootstrapOrchestrator>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            data,
            orchestrator,
            redirect_url: redirect_url.into(),
        }
    }

    /// Uses the OAuth redirect derived from the site URL and callback path.
    pub fn from_config(
        identity: Arc<dyn IdentityProvider>,
        data: Arc<dyn DataStore>,
        orchestrator: Arc<BootstrapOrchestrator>,
        config: &DevPlayConfig,
    ) -> Self {
        let redirect = config.auth.redirect_url(&config.app.site_url);
        Self::new(identity, data, orchestrator, redirect)
    }

    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    /// Starts OAuth and returns the URL to open.
    pub async fn sign_in_with_provider(
        &self,
        provider: OAuthProvider,
    ) -> Result<String, DevPlayError> {
        let store = self.orchestrator.store();
        store.clear_error();
        match self
            .identity
            .sign_in_with_oauth(provider, &self.redirect_url)
            .await
        {
            Ok(url) => {
                info!(%provider, "oauth sign-in started");
                Ok(url)
            }
            Err(e) => {
                warn!(%provider, error = %e, "oauth sign-in failed");
                store.record_error(e.user_message());
                Err(e)
            }
        }
    }

    /// Signs out with the identity provider, then clears the store.
    pub async fn sign_out(&self) -> Result<(), DevPlayError> {
        let store = self.orchestrator.store();
        store.clear_error();
        match self.identity.sign_out().await {
            Ok(()) => {
                self.orchestrator.sign_out_observed();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "sign-out failed");
                store.record_error(e.user_message());
                Err(e)
            }
        }
    }

    /// Applies `update` to the caller's own profile and stores the result.
    ///
    /// The stored profile is only replaced while the same session is live.
    pub async fn update_profile(&self, mut update: ProfileUpdate) -> Result<Profile, DevPlayError> {
        let generation = self.orchestrator.generation();
        let user = self.current_user().await?;

        if let Some(raw) = update.username.take() {
            let nickname = validate_nickname(&raw)?.to_string();
            ensure_nickname_free(self.data.as_ref(), &nickname, Some(&user.id)).await?;
            update.username = Some(nickname);
        }
        if update.is_empty() {
            return Err(DevPlayError::validation("profile", "변경할 내용이 없습니다."));
        }

        let query = Query::table(Table::Profiles).eq("user_id", &user.id);
        let profile: Profile = update_one(self.data.as_ref(), &query, &update)
            .await
            .inspect_err(|e| self.orchestrator.store().record_error(e.user_message()))?;

        info!(user_id = %user.id, "profile updated");
        self.orchestrator
            .commit_profile(generation, &user.id, Some(profile.clone()));
        Ok(profile)
    }

    /// Re-reads the caller's profile into the store.
    ///
    /// A missing profile puts the gate back into nickname setup.
    /// A result that arrives after a sign-out or account switch is dropped.
    pub async fn refresh_profile(&self) -> Result<Option<Profile>, DevPlayError> {
        let generation = self.orchestrator.generation();
        let user = self.current_user().await?;
        let profile = self.orchestrator.resolver().resolve(&user.id).await?;
        self.orchestrator
            .commit_profile(generation, &user.id, profile.clone());
        Ok(profile)
    }

    async fn current_user(&self) -> Result<AuthUser, DevPlayError> {
        self.identity
            .get_user()
            .await?
            .ok_or(DevPlayError::NotAuthenticated)
    }
}
