// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hosted backend adapter for DevPlay.
//!
//! [`SupabaseAuth`] implements [`IdentityProvider`](devplay_core::IdentityProvider)
//! against the auth endpoints and [`SupabaseData`] implements
//! [`DataStore`](devplay_core::DataStore) against the REST endpoint. Both
//! share one [`SupabaseClient`], so data requests carry the signed-in user's
//! token. No request is retried automatically.

pub mod auth;
pub mod client;
pub mod data;
pub mod error;
pub mod postgrest;
pub mod storage;
pub mod types;

use std::sync::Arc;

use devplay_config::DevPlayConfig;
use devplay_core::DevPlayError;
use tracing::info;

pub use auth::SupabaseAuth;
pub use client::{SessionHandle, SupabaseClient};
pub use data::SupabaseData;
pub use error::map_error;
pub use storage::FileSessionStorage;

/// Both adapters over one shared client.
#[derive(Clone)]
pub struct Supabase {
    pub auth: Arc<SupabaseAuth>,
    pub data: Arc<SupabaseData>,
}

/// Builds the adapters from configuration.
pub fn connect(config: &DevPlayConfig) -> Result<Supabase, DevPlayError> {
    let client = SupabaseClient::new(&config.backend, &config.auth)?;
    info!(
        url = %client.base_url(),
        session_path = %client.storage().path().display(),
        "backend client ready"
    );
    Ok(Supabase {
        auth: Arc::new(SupabaseAuth::new(client.clone())),
        data: Arc::new(SupabaseData::new(client)),
    })
}
