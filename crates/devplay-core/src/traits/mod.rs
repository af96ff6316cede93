// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for the two external collaborators.
//!
//! Both extend [`BackendAdapter`] and use `#[async_trait]` so they can be
//! held as `Arc<dyn ...>`.

pub mod adapter;
pub mod data;
pub mod identity;

pub use adapter::BackendAdapter;
pub use data::DataStore;
pub use identity::IdentityProvider;
