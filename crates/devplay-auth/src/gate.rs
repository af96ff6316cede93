// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The gating state machine in front of the application.
//!
//! `Loading` shows only a spinner, `NeedsSetup` shows only the nickname
//! form, and `Ready` renders the application, logged in or out.

use devplay_core::{DevPlayError, Role, UserId};
use serde::Serialize;
use strum::Display;
use tokio::sync::watch;

use crate::store::{AuthSnapshot, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GateState {
    Loading,
    NeedsSetup,
    Ready,
}

impl GateState {
    /// Pure function of the snapshot.
    pub fn from_snapshot(snapshot: &AuthSnapshot) -> Self {
        if snapshot.is_loading {
            GateState::Loading
        } else if snapshot.session.is_some() && snapshot.profile.is_none() && snapshot.needs_setup {
            GateState::NeedsSetup
        } else {
            GateState::Ready
        }
    }
}

/// Header identity for a signed-in user with a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Viewer {
    /// Nickname shown in the header.
    pub username: String,
    /// Current role, for role-gated menu entries.
    pub role: Role,
    /// Avatar image, if the user set one.
    pub avatar_url: Option<String>,
}

/// What the front end should draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum GateView {
    Spinner,
    /// Only the nickname form; everything else is blocked.
    NicknameForm { user_id: UserId },
    App {
        viewer: Option<Viewer>,
        /// The login button shows when no profile-backed viewer exists.
        login_visible: bool,
    },
}

impl GateView {
    pub fn from_snapshot(snapshot: &AuthSnapshot) -> Self {
        match GateState::from_snapshot(snapshot) {
            GateState::Loading => GateView::Spinner,
            GateState::NeedsSetup => match snapshot.user_id() {
                Some(user_id) => GateView::NicknameForm {
                    user_id: user_id.clone(),
                },
                None => GateView::Spinner,
            },
            GateState::Ready => {
                let viewer = snapshot.profile.as_ref().map(|p| Viewer {
                    username: p.username.clone(),
                    role: p.role,
                    avatar_url: p.avatar_url.clone(),
                });
                GateView::App {
                    login_visible: viewer.is_none(),
                    viewer,
                }
            }
        }
    }
}

/// A live view of the gate, backed by the store's watch channel.
#[derive(Clone)]
pub struct Gate {
    rx: watch::Receiver<AuthSnapshot>,
}

impl Gate {
    /// Starts watching `store` at its current state.
    pub fn new(store: &SessionStore) -> Self {
        Self { rx: store.watch() }
    }

    /// Gate state right now.
    pub fn state(&self) -> GateState {
        GateState::from_snapshot(&self.rx.borrow())
    }

    /// What to draw right now.
    pub fn render(&self) -> GateView {
        GateView::from_snapshot(&self.rx.borrow())
    }

    /// Waits for the next state change of any kind.
    pub async fn changed(&mut self) -> Result<GateState, DevPlayError> {
        self.rx.changed().await.map_err(|_| closed())?;
        Ok(self.state())
    }

    /// Waits until the gate has left `Loading`.
    pub async fn wait_until_settled(&mut self) -> Result<GateState, DevPlayError> {
        let snapshot = self
            .rx
            .wait_for(|s| !s.is_loading)
            .await
            .map_err(|_| closed())?;
        Ok(GateState::from_snapshot(&snapshot))
    }
}

fn closed() -> DevPlayError {
    DevPlayError::Internal("session store dropped".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use devplay_test_utils::fixtures::{profile_for, session_for};

    fn snapshot(
        session: bool,
        profile: bool,
        is_loading: bool,
        needs_setup: bool,
    ) -> AuthSnapshot {
        AuthSnapshot {
            session: session.then(|| session_for("u1")),
            profile: profile.then(|| profile_for("u1", "alice")),
            is_loading,
            error: None,
            needs_setup,
        }
    }

    #[test]
    fn state_table() {
        assert_eq!(GateState::from_snapshot(&snapshot(false, false, true, false)), GateState::Loading);
        assert_eq!(GateState::from_snapshot(&snapshot(true, false, true, true)), GateState::Loading);
        assert_eq!(GateState::from_snapshot(&snapshot(true, false, false, true)), GateState::NeedsSetup);
        assert_eq!(GateState::from_snapshot(&snapshot(true, true, false, false)), GateState::Ready);
        assert_eq!(GateState::from_snapshot(&snapshot(false, false, false, false)), GateState::Ready);
        // Lookup failed: logged-out-equivalent, not setup.
        assert_eq!(GateState::from_snapshot(&snapshot(true, false, false, false)), GateState::Ready);
    }

    #[test]
    fn logged_out_render_shows_login() {
        let view = GateView::from_snapshot(&snapshot(false, false, false, false));
        assert_eq!(
            view,
            GateView::App {
                viewer: None,
                login_visible: true
            }
        );
    }

    #[test]
    fn ready_render_shows_username() {
        match GateView::from_snapshot(&snapshot(true, true, false, false)) {
            GateView::App { viewer: Some(v), login_visible } => {
                assert_eq!(v.username, "alice");
                assert!(!login_visible);
            }
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn needs_setup_renders_only_form() {
        let view = GateView::from_snapshot(&snapshot(true, false, false, true));
        assert_eq!(
            view,
            GateView::NicknameForm {
                user_id: UserId::from("u1")
            }
        );
    }

    #[test]
    fn gate_state_display() {
        assert_eq!(GateState::NeedsSetup.to_string(), "needs-setup");
    }

    #[tokio::test]
    async fn wait_until_settled_follows_store() {
        let store = SessionStore::new();
        let mut gate = Gate::new(&store);
        assert_eq!(gate.state(), GateState::Loading);

        let waiter = tokio::spawn(async move { gate.wait_until_settled().await });
        store.finish_bootstrap(Some(session_for("u1")), None);
        assert_eq!(waiter.await.unwrap().unwrap(), GateState::NeedsSetup);
    }
}
