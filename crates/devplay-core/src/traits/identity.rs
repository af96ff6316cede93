// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity subsystem contract: session restore, OAuth, and auth events.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::DevPlayError;
use crate::traits::adapter::BackendAdapter;
use crate::types::{AuthEvent, AuthUser, OAuthProvider, Session};

/// The external identity subsystem.
///
/// Owns session persistence and token refresh. The client only reads
/// sessions and reacts to [`AuthEvent`]s.
#[async_trait]
pub trait IdentityProvider: BackendAdapter {
    /// Restores the persisted session, if any.
    async fn get_session(&self) -> Result<Option<Session>, DevPlayError>;

    /// Subscribes to auth state notifications.
    ///
    /// Dropping the receiver releases the subscription.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Starts an OAuth sign-in and returns the URL the user must visit.
    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, DevPlayError>;

    /// Ends the current session.
    async fn sign_out(&self) -> Result<(), DevPlayError>;

    /// Returns the user behind the current session.
    async fn get_user(&self) -> Result<Option<AuthUser>, DevPlayError>;
}
