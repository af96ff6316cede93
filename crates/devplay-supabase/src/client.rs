// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP client for the hosted backend.
//!
//! Holds the project URL, the public API key and the live session. Both
//! [`SupabaseAuth`](crate::SupabaseAuth) and [`SupabaseData`](crate::SupabaseData)
//! clone one client so data requests carry the signed-in user's token.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use devplay_config::model::{AuthConfig, BackendConfig};
use devplay_core::{DevPlayError, Session};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::error::map_error;
use crate::storage::FileSessionStorage;

/// The in-memory session shared by the auth and data halves.
pub type SessionHandle = Arc<RwLock<Option<Session>>>;

#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    timeout: Duration,
    session: SessionHandle,
    storage: FileSessionStorage,
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .field("session_path", &self.storage.path())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Builds a client from the `[backend]` and `[auth]` sections.
    ///
    /// Fails with [`DevPlayError::Config`] when the backend URL or key is
    /// missing or malformed.
    pub fn new(backend: &BackendConfig, auth: &AuthConfig) -> Result<Self, DevPlayError> {
        let raw_url = backend
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DevPlayError::Config("backend.url is not set".into()))?;
        let anon_key = backend
            .anon_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DevPlayError::Config("backend.anon_key is not set".into()))?;

        // Url::join drops the last path segment unless the base ends in '/'.
        let normalized = format!("{}/", raw_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| DevPlayError::Config(format!("invalid backend.url '{raw_url}': {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(anon_key).map_err(|e| {
                DevPlayError::Config(format!("invalid backend.anon_key header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let timeout = backend.request_timeout();
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DevPlayError::transport("failed to build HTTP client", e))?;

        Ok(Self {
            http,
            base_url,
            anon_key: anon_key.to_string(),
            timeout,
            session: Arc::new(RwLock::new(None)),
            storage: FileSessionStorage::new(&auth.session_path),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn storage(&self) -> &FileSessionStorage {
        &self.storage
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session;
    }

    /// The token for the `Authorization` header: the user's access token,
    /// or the anon key when signed out.
    pub async fn bearer(&self) -> String {
        match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        }
    }

    /// Resolves `path` (which may carry a query) against the project URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, DevPlayError> {
        self.base_url
            .join(path)
            .map_err(|e| DevPlayError::Internal(format!("invalid endpoint '{path}': {e}")))
    }

    /// Starts a request authorized as the current user.
    pub async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self.bearer().await;
        self.http.request(method, url).bearer_auth(token)
    }

    /// Starts a request with an explicit bearer token.
    pub fn request_with_token(&self, method: Method, url: Url, token: &str) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(token)
    }

    /// Sends `request` and maps failures. Non-success statuses are decoded
    /// through [`map_error`].
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, DevPlayError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        debug!(status = %status, url = %response.url().path(), "backend response received");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_error(status, &body))
    }

    /// Sends `request` and decodes a JSON body.
    pub async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, DevPlayError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DevPlayError::transport("failed to decode backend response", e))
    }

    fn transport_error(&self, e: reqwest::Error) -> DevPlayError {
        if e.is_timeout() {
            DevPlayError::Timeout {
                duration: self.timeout,
            }
        } else {
            DevPlayError::transport(format!("HTTP request failed: {e}"), e)
        }
    }
}
