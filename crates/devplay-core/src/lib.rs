// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the DevPlay client.
//!
//! This crate provides the domain types, the error type, and the two adapter
//! traits ([`IdentityProvider`] and [`DataStore`]) that every other crate in
//! the workspace is written against.

pub mod error;
pub mod models;
pub mod query;
pub mod traits;
pub mod types;

pub use error::DevPlayError;
pub use query::{Filter, Order, Query, Table};
pub use types::{
    AdapterType, AuthEvent, AuthUser, AuthorSummary, HealthStatus, OAuthProvider, Profile,
    ProfileId, Role, Session, UserId,
};

pub use traits::{BackendAdapter, DataStore, IdentityProvider};
