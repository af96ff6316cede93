// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup session restore and profile resolution, guarded by a generation counter.
//!
//! Every attempt captures the generation when it starts. Sign-in and
//! sign-out observations advance the counter, so an attempt that finishes
//! after a newer one began is discarded instead of committed. The check and
//! the commit happen under the store's write lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use devplay_core::{IdentityProvider, Profile, Session, UserId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::resolver::ProfileResolver;
use crate::store::{SessionStore, Transition};

/// How a bootstrap or resolution attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Result written to the store.
    Committed,
    /// A newer attempt started, the user changed, or the listener was torn
    /// down; the result was dropped.
    Superseded,
    /// An attempt for the same generation was already running.
    Joined,
}

/// Runs session restore and profile resolution into a [`SessionStore`].
pub struct BootstrapOrchestrator {
    identity: Arc<dyn IdentityProvider>,
    resolver: ProfileResolver,
    store: Arc<SessionStore>,
    generation: AtomicU64,
    in_flight: Mutex<Option<u64>>,
}

impl BootstrapOrchestrator {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        resolver: ProfileResolver,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            identity,
            resolver,
            store,
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    /// Orchestrator with a fresh store, ready to share with the listener.
    pub fn shared(identity: Arc<dyn IdentityProvider>, resolver: ProfileResolver) -> Arc<Self> {
        Arc::new(Self::new(identity, resolver, Arc::new(SessionStore::new())))
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn resolver(&self) -> &ProfileResolver {
        &self.resolver
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// Current generation. Capture it before awaiting and pass it back on commit.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidates every attempt in flight and returns the new generation.
    pub fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Restores the persisted session and resolves its profile.
    ///
    /// Always leaves the store out of the loading state unless superseded by
    /// a newer attempt, which then owns the commit.
    pub async fn bootstrap(&self) -> Outcome {
        let generation = self.generation();
        let Some(_marker) = InFlight::claim(&self.in_flight, generation) else {
            debug!(generation, "bootstrap already running for this generation");
            return Outcome::Joined;
        };

        self.store.begin_bootstrap();
        info!(generation, "bootstrap started");

        let session = match self.identity.get_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(generation, error = %e, "session restore failed");
                return self.commit(
                    generation,
                    None,
                    None,
                    Transition::Fail {
                        session: None,
                        message: e.user_message(),
                    },
                );
            }
        };

        match session {
            None => self.commit(
                generation,
                None,
                None,
                Transition::Finish {
                    session: None,
                    profile: None,
                },
            ),
            Some(session) => self.resolve_and_commit(generation, session, None).await,
        }
    }

    /// Records an observed sign-in and returns the generation its
    /// resolution must carry.
    pub fn begin_sign_in(&self, session: Session) -> u64 {
        let generation = self.advance();
        debug!(generation, user_id = %session.user_id(), "sign-in observed");
        self.store.apply(Transition::BeginResolution(session));
        generation
    }

    /// Records an observed sign-out. In-flight resolutions can no longer commit.
    pub fn sign_out_observed(&self) -> u64 {
        let generation = self.advance();
        self.store.clear();
        info!(generation, "signed out");
        generation
    }

    /// Resolves the profile for a session delivered by an auth event.
    ///
    /// Commits only while `generation` is current, the store still holds
    /// the same user, and `cancel` has not fired.
    pub async fn resolve_for(
        &self,
        session: Session,
        generation: u64,
        cancel: &CancellationToken,
    ) -> Outcome {
        if cancel.is_cancelled() {
            return Outcome::Superseded;
        }
        self.resolve_and_commit(generation, session, Some(cancel))
            .await
    }

    /// Writes a profile produced by a user action, such as nickname setup,
    /// that started at `generation` for `user`.
    ///
    /// The write lands only if no sign-in or sign-out was observed since and
    /// the store still holds `user`'s session. `None` means the user has no
    /// profile and puts the gate into nickname setup.
    pub fn commit_profile(
        &self,
        generation: u64,
        user: &UserId,
        profile: Option<Profile>,
    ) -> Outcome {
        let transition = match profile {
            Some(profile) => Transition::SetProfile(Some(profile)),
            None => Transition::MarkNeedsSetup,
        };
        let applied = self.store.apply_if(
            |state| self.generation() == generation && state.user_id() == Some(user),
            transition,
        );
        if applied {
            Outcome::Committed
        } else {
            debug!(
                generation,
                current = self.generation(),
                user_id = %user,
                "discarding profile write for a replaced session"
            );
            Outcome::Superseded
        }
    }

    async fn resolve_and_commit(
        &self,
        generation: u64,
        session: Session,
        cancel: Option<&CancellationToken>,
    ) -> Outcome {
        let user_id = session.user_id().clone();
        let transition = match self.resolver.resolve(&user_id).await {
            Ok(Some(profile)) => Transition::Finish {
                session: Some(session),
                profile: Some(profile),
            },
            Ok(None) => {
                info!(user_id = %user_id, "no profile yet, nickname setup required");
                Transition::Finish {
                    session: Some(session),
                    profile: None,
                }
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "profile lookup failed");
                Transition::Fail {
                    session: Some(session),
                    message: e.user_message(),
                }
            }
        };
        self.commit(generation, Some(&user_id), cancel, transition)
    }

    fn commit(
        &self,
        generation: u64,
        expected_user: Option<&UserId>,
        cancel: Option<&CancellationToken>,
        transition: Transition,
    ) -> Outcome {
        let from_event = cancel.is_some();
        let applied = self.store.apply_if(
            |state| {
                if cancel.is_some_and(CancellationToken::is_cancelled) {
                    return false;
                }
                if self.generation() != generation {
                    return false;
                }
                // Event-driven resolutions must still match the session the
                // listener recorded; bootstrap itself sets the session.
                match expected_user {
                    Some(user) if from_event => state.user_id() == Some(user),
                    _ => true,
                }
            },
            transition,
        );

        if applied {
            Outcome::Committed
        } else {
            debug!(
                generation,
                current = self.generation(),
                "discarding stale resolution"
            );
            Outcome::Superseded
        }
    }
}

/// Marks a generation as having a bootstrap in flight; released on drop.
struct InFlight<'a> {
    slot: &'a Mutex<Option<u64>>,
    generation: u64,
}

impl<'a> InFlight<'a> {
    fn claim(slot: &'a Mutex<Option<u64>>, generation: u64) -> Option<Self> {
        let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
        if *guard == Some(generation) {
            return None;
        }
        *guard = Some(generation);
        Some(Self { slot, generation })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if *guard == Some(self.generation) {
            *guard = None;
        }
    }
}

impl std::fmt::Debug for BootstrapOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapOrchestrator")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
