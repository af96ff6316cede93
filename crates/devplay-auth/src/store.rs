// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The session store: current session, resolved profile, and status flags.
//!
//! State changes only through [`Transition`]s. Readers take an
//! [`AuthSnapshot`] or subscribe with [`SessionStore::watch`].

use devplay_core::{Profile, Session, UserId};
use tokio::sync::watch;
use tracing::debug;

/// Immutable view of the store at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    /// The live session, if signed in.
    pub session: Option<Session>,
    /// The signed-in user's profile. Always owned by `session`'s user.
    pub profile: Option<Profile>,
    /// A bootstrap or sign-in resolution has not finished yet.
    pub is_loading: bool,
    /// Last user-facing failure message.
    pub error: Option<String>,
    /// Signed in, resolution finished, and no profile exists.
    pub needs_setup: bool,
}

impl AuthSnapshot {
    /// State before any bootstrap has run.
    pub fn initial() -> Self {
        Self {
            session: None,
            profile: None,
            is_loading: true,
            error: None,
            needs_setup: false,
        }
    }

    /// Id of the signed-in user, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        self.session.as_ref().map(Session::user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    fn belongs_to(&self, user: &UserId) -> bool {
        self.user_id() == Some(user)
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// A defined state change.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Bootstrap started: loading, error cleared.
    BeginBootstrap,
    /// Bootstrap or a resolution finished.
    Finish {
        session: Option<Session>,
        profile: Option<Profile>,
    },
    /// Bootstrap failed; finish as logged-out-equivalent with the error kept.
    Fail {
        session: Option<Session>,
        message: String,
    },
    /// A sign-in was observed and its profile is about to be resolved.
    BeginResolution(Session),
    /// Session replaced in place (token refresh, user update).
    SetSession(Option<Session>),
    /// Profile stored; refused when it is not the session user's.
    SetProfile(Option<Profile>),
    /// Resolution found no profile for the session's user.
    MarkNeedsSetup,
    /// Signed out.
    Clear,
    ClearError,
    /// Record an error without touching anything else.
    RecordError(String),
}

impl Transition {
    fn name(&self) -> &'static str {
        match self {
            Transition::BeginBootstrap => "begin_bootstrap",
            Transition::Finish { .. } => "finish",
            Transition::Fail { .. } => "fail",
            Transition::BeginResolution(_) => "begin_resolution",
            Transition::SetSession(_) => "set_session",
            Transition::SetProfile(_) => "set_profile",
            Transition::MarkNeedsSetup => "mark_needs_setup",
            Transition::Clear => "clear",
            Transition::ClearError => "clear_error",
            Transition::RecordError(_) => "record_error",
        }
    }

    /// Whether the transition is consistent with `state` at all.
    ///
    /// A profile is only ever stored next to its owner's session.
    fn admits(&self, state: &AuthSnapshot) -> bool {
        match self {
            Transition::SetProfile(Some(profile)) => state.belongs_to(&profile.user_id),
            _ => true,
        }
    }

    fn apply(self, state: &mut AuthSnapshot) {
        match self {
            Transition::BeginBootstrap => {
                state.is_loading = true;
                state.error = None;
            }
            Transition::Finish { session, profile } => {
                state.needs_setup = session.is_some() && profile.is_none();
                state.session = session;
                state.profile = profile;
                state.is_loading = false;
                state.error = None;
            }
            Transition::Fail { session, message } => {
                state.session = session;
                state.profile = None;
                state.needs_setup = false;
                state.is_loading = false;
                state.error = Some(message);
            }
            Transition::BeginResolution(session) => {
                let same_user = state.belongs_to(session.user_id());
                if !same_user {
                    state.profile = None;
                    state.needs_setup = false;
                }
                // A known user with a profile keeps rendering while we re-check.
                state.is_loading = !(same_user && state.profile.is_some());
                state.session = Some(session);
            }
            Transition::SetSession(session) => {
                let keep_profile = match (&session, &state.profile) {
                    (Some(s), Some(p)) => &p.user_id == s.user_id(),
                    _ => false,
                };
                if !keep_profile {
                    state.profile = None;
                }
                if session.is_none() {
                    state.needs_setup = false;
                }
                state.session = session;
            }
            Transition::SetProfile(profile) => {
                if profile.is_some() {
                    state.needs_setup = false;
                }
                state.profile = profile;
            }
            Transition::MarkNeedsSetup => {
                state.needs_setup = state.session.is_some();
                state.profile = None;
                state.is_loading = false;
            }
            Transition::Clear => {
                state.session = None;
                state.profile = None;
                state.needs_setup = false;
                state.is_loading = false;
                state.error = None;
            }
            Transition::ClearError => state.error = None,
            Transition::RecordError(message) => state.error = Some(message),
        }
    }
}

/// Holds the auth state and broadcasts every change.
///
/// Constructed per application (or per test); there is no global instance.
pub struct SessionStore {
    tx: watch::Sender<AuthSnapshot>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthSnapshot::initial());
        Self { tx }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    /// Subscribes to state changes. The receiver starts at the current state.
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    pub fn apply(&self, transition: Transition) {
        self.apply_if(|_| true, transition);
    }

    /// Applies `transition` only if `guard` accepts the current state.
    ///
    /// The guard runs under the store's write lock, so a check and the
    /// following mutation cannot interleave with another transition.
    pub fn apply_if(
        &self,
        guard: impl FnOnce(&AuthSnapshot) -> bool,
        transition: Transition,
    ) -> bool {
        let name = transition.name();
        let mut applied = false;
        self.tx.send_if_modified(|state| {
            if !guard(state) || !transition.admits(state) {
                return false;
            }
            transition.apply(state);
            applied = true;
            true
        });
        if applied {
            let state = self.tx.borrow();
            debug!(
                transition = name,
                has_session = state.session.is_some(),
                has_profile = state.profile.is_some(),
                is_loading = state.is_loading,
                needs_setup = state.needs_setup,
                "session store updated"
            );
        }
        applied
    }

    pub fn begin_bootstrap(&self) {
        self.apply(Transition::BeginBootstrap);
    }

    pub fn finish_bootstrap(&self, session: Option<Session>, profile: Option<Profile>) {
        self.apply(Transition::Finish { session, profile });
    }

    pub fn fail_bootstrap(&self, session: Option<Session>, message: impl Into<String>) {
        self.apply(Transition::Fail {
            session,
            message: message.into(),
        });
    }

    /// Replaces the session. The profile survives only for the same user.
    pub fn set_session(&self, session: Option<Session>) {
        self.apply(Transition::SetSession(session));
    }

    /// Stores `profile`. Returns false when it belongs to someone other
    /// than the session's user.
    pub fn set_profile(&self, profile: Option<Profile>) -> bool {
        self.apply_if(|_| true, Transition::SetProfile(profile))
    }

    pub fn mark_needs_setup(&self) {
        self.apply(Transition::MarkNeedsSetup);
    }

    /// Signed out: everything reset, not loading.
    pub fn clear(&self) {
        self.apply(Transition::Clear);
    }

    pub fn clear_error(&self) {
        self.apply(Transition::ClearError);
    }

    pub fn record_error(&self, message: impl Into<String>) {
        self.apply(Transition::RecordError(message.into()));
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
