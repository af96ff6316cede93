// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by every backend adapter.

use async_trait::async_trait;

use crate::error::DevPlayError;
use crate::types::{AdapterType, HealthStatus};

/// Identity and health reporting for an external collaborator.
///
/// Both the identity and the data adapters implement this, so the CLI's
/// `status` command can report on whichever implementation is wired in.
#[async_trait]
pub trait BackendAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns which collaborator this adapter stands in for.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, DevPlayError>;
}
