// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity provider backed by the hosted auth endpoints.
//!
//! The session lives in memory (shared with [`SupabaseData`](crate::SupabaseData))
//! and on disk via [`FileSessionStorage`](crate::FileSessionStorage). The first
//! [`get_session`](IdentityProvider::get_session) call restores it from disk,
//! refreshing an expiring token, and announces the result as
//! [`AuthEvent::InitialSession`].

use async_trait::async_trait;
use chrono::Utc;
use devplay_core::{
    AdapterType, AuthEvent, AuthUser, BackendAdapter, DevPlayError, HealthStatus,
    IdentityProvider, OAuthProvider, Session,
};
use reqwest::Method;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};
use url::Url;

use crate::client::SupabaseClient;
use crate::types::{RefreshRequest, TokenResponse, UserResponse};

/// Tokens expiring within this many seconds are refreshed before use.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

const EVENT_CAPACITY: usize = 64;

pub struct SupabaseAuth {
    client: SupabaseClient,
    events: broadcast::Sender<AuthEvent>,
    // Serializes restore and refresh; true once the disk session was read.
    restored: Mutex<bool>,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            events,
            restored: Mutex::new(false),
        }
    }

    pub fn client(&self) -> &SupabaseClient {
        &self.client
    }

    /// Finishes an implicit-grant OAuth sign-in.
    ///
    /// `callback` is the URL the provider redirected to (or just its
    /// `#fragment`). Tokens are read from the fragment, falling back to the
    /// query string.
    pub async fn complete_oauth(&self, callback: &str) -> Result<Session, DevPlayError> {
        let params = callback_params(callback)?;
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .filter(|v| !v.is_empty())
        };

        if let Some(error) = get("error") {
            let message = get("error_description").unwrap_or(error).to_string();
            warn!(error, "OAuth provider returned an error");
            return Err(DevPlayError::PermissionDenied { message });
        }
        let access_token = get("access_token").ok_or_else(|| {
            DevPlayError::validation("callback", "로그인 콜백에 access_token이 없습니다.")
        })?;
        let refresh_token = get("refresh_token").unwrap_or_default();

        let now = Utc::now().timestamp();
        let expires_at = get("expires_at")
            .and_then(|v| v.parse::<i64>().ok())
            .or_else(|| {
                get("expires_in")
                    .and_then(|v| v.parse::<i64>().ok())
                    .map(|secs| now + secs)
            });

        let user = self.fetch_user(access_token).await?;
        let session = Session {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            token_type: get("token_type").unwrap_or("bearer").to_string(),
            expires_at,
            user,
        };

        let mut restored = self.restored.lock().await;
        *restored = true;
        self.client.storage().save(&session).await?;
        self.client.set_session(Some(session.clone())).await;
        drop(restored);

        info!(user_id = %session.user.id, "signed in");
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<AuthUser, DevPlayError> {
        let url = self.client.endpoint("auth/v1/user")?;
        let user: UserResponse = self
            .client
            .send_json(self.client.request_with_token(Method::GET, url, access_token))
            .await?;
        Ok(user.into())
    }

    /// Reads the persisted session, refreshing it if it is about to expire.
    async fn restore(&self) -> Result<Option<Session>, DevPlayError> {
        let Some(stored) = self.client.storage().load().await? else {
            return Ok(None);
        };
        let session = if expiring(&stored) {
            self.refresh(&stored).await?
        } else {
            Some(stored)
        };
        self.client.set_session(session.clone()).await;
        Ok(session)
    }

    /// Exchanges the refresh token for a new session.
    ///
    /// A refresh token the backend rejects ends the session: the file is
    /// removed and `None` is returned.
    async fn refresh(&self, session: &Session) -> Result<Option<Session>, DevPlayError> {
        let url = self.client.endpoint("auth/v1/token?grant_type=refresh_token")?;
        let request = self
            .client
            .request_with_token(Method::POST, url, &self.client.bearer().await)
            .json(&RefreshRequest {
                refresh_token: &session.refresh_token,
            });

        match self.client.send_json::<TokenResponse>(request).await {
            Ok(token) => {
                let fresh = token.into_session(Utc::now().timestamp());
                self.client.storage().save(&fresh).await?;
                self.client.set_session(Some(fresh.clone())).await;
                debug!(user_id = %fresh.user.id, expires_at = ?fresh.expires_at, "access token refreshed");
                Ok(Some(fresh))
            }
            Err(e) if refresh_rejected(&e) => {
                warn!(user_id = %session.user.id, error = %e, "refresh token rejected; clearing session");
                self.client.storage().clear().await?;
                self.client.set_session(None).await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn emit(&self, event: AuthEvent) {
        debug!(event = event.kind(), receivers = self.events.receiver_count(), "auth event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl BackendAdapter for SupabaseAuth {
    fn name(&self) -> &str {
        "supabase-auth"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Identity
    }

    async fn health_check(&self) -> Result<HealthStatus, DevPlayError> {
        let url = self.client.endpoint("auth/v1/health")?;
        match self.client.send(self.client.request(Method::GET, url).await).await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn get_session(&self) -> Result<Option<Session>, DevPlayError> {
        let mut restored = self.restored.lock().await;
        if !*restored {
            let session = self.restore().await?;
            *restored = true;
            drop(restored);
            self.emit(AuthEvent::InitialSession(session.clone()));
            return Ok(session);
        }

        match self.client.current_session().await {
            Some(current) if expiring(&current) => {
                let refreshed = self.refresh(&current).await?;
                drop(restored);
                match &refreshed {
                    Some(fresh) => self.emit(AuthEvent::TokenRefreshed(fresh.clone())),
                    None => self.emit(AuthEvent::SignedOut),
                }
                Ok(refreshed)
            }
            other => Ok(other),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String, DevPlayError> {
        let mut url = self.client.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", &provider.to_string())
            .append_pair("redirect_to", redirect_to);
        info!(%provider, "OAuth sign-in started");
        Ok(url.into())
    }

    async fn sign_out(&self) -> Result<(), DevPlayError> {
        let mut restored = self.restored.lock().await;
        *restored = true;
        if let Some(session) = self.client.current_session().await {
            let url = self.client.endpoint("auth/v1/logout")?;
            let request = self
                .client
                .request_with_token(Method::POST, url, &session.access_token);
            if let Err(e) = self.client.send(request).await {
                warn!(user_id = %session.user.id, error = %e, "remote logout failed; clearing local session anyway");
            }
        }
        self.client.storage().clear().await?;
        self.client.set_session(None).await;
        drop(restored);

        info!("signed out");
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    async fn get_user(&self) -> Result<Option<AuthUser>, DevPlayError> {
        Ok(self.get_session().await?.map(|s| s.user))
    }
}

fn expiring(session: &Session) -> bool {
    session.is_expired_at(Utc::now().timestamp() + EXPIRY_MARGIN_SECS)
}

fn refresh_rejected(e: &DevPlayError) -> bool {
    matches!(
        e,
        DevPlayError::PermissionDenied { .. } | DevPlayError::NotFound { .. }
    ) || matches!(e, DevPlayError::Backend { code, .. } if code.as_deref().is_some_and(|c| {
        c.starts_with("refresh_token") || c == "invalid_grant" || c == "session_not_found"
    }))
}

/// Key/value pairs from the callback's fragment, or its query when the
/// fragment carries none.
fn callback_params(callback: &str) -> Result<Vec<(String, String)>, DevPlayError> {
    let trimmed = callback.trim();
    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => Url::parse("http://localhost/")
            .and_then(|base| base.join(trimmed))
            .map_err(|e| DevPlayError::validation("callback", format!("잘못된 콜백 URL입니다: {e}")))?,
    };
    let decode = |raw: &str| -> Vec<(String, String)> {
        url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect()
    };
    let from_fragment = url.fragment().map(decode).unwrap_or_default();
    if !from_fragment.is_empty() {
        return Ok(from_fragment);
    }
    Ok(url.query().map(decode).unwrap_or_default())
}
