// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session bootstrap and auth gating for the DevPlay client.
//!
//! Startup restores the persisted session and resolves the user's profile
//! ([`BootstrapOrchestrator`]), auth events from the identity provider keep
//! the [`SessionStore`] current ([`AuthEventListener`]), and the [`Gate`]
//! decides whether to show a spinner, the nickname form, or the application.

pub mod access;
pub mod actions;
pub mod bootstrap;
pub mod gate;
pub mod listener;
pub mod nickname;
pub mod resolver;
pub mod runtime;
pub mod store;

pub use access::{Access, AccessDecision};
pub use actions::{AuthActions, ProfileUpdate};
pub use bootstrap::{BootstrapOrchestrator, Outcome};
pub use gate::{Gate, GateState, GateView, Viewer};
pub use listener::{AuthEventListener, ListenerHandle};
pub use nickname::NicknameSetup;
pub use resolver::ProfileResolver;
pub use runtime::AuthRuntime;
pub use store::{AuthSnapshot, SessionStore, Transition};
