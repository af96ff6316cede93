// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for DevPlay integration tests.
//!
//! Provides mock adapters and a harness for fast, deterministic tests
//! without a hosted backend.
//!
//! # Components
//!
//! - [`MockIdentity`] - scriptable identity provider with event injection
//! - [`MemoryStore`] - in-memory data store with constraint emulation
//! - [`TestApp`] - a running auth stack over both mocks

pub mod fixtures;
pub mod harness;
pub mod memory_store;
pub mod mock_identity;

pub use harness::{TestApp, TestAppBuilder};
pub use memory_store::MemoryStore;
pub use mock_identity::MockIdentity;
