// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolves the signed-in user to their profile row.

use std::sync::Arc;

use devplay_core::traits::data::select_maybe;
use devplay_core::{
    AuthUser, DataStore, DevPlayError, IdentityProvider, Profile, ProfileId, Query, Table,
};

/// Maps the signed-in identity to its profile row.
#[derive(Clone)]
pub struct CurrentProfile {
    identity: Arc<dyn IdentityProvider>,
    data: Arc<dyn DataStore>,
}

impl CurrentProfile {
    pub fn new(identity: Arc<dyn IdentityProvider>, data: Arc<dyn DataStore>) -> Self {
        Self { identity, data }
    }

    pub fn data(&self) -> &Arc<dyn DataStore> {
        &self.data
    }

    /// The signed-in identity. Fails with `NotAuthenticated` when signed out.
    pub async fn user(&self) -> Result<AuthUser, DevPlayError> {
        self.identity
            .get_user()
            .await?
            .ok_or(DevPlayError::NotAuthenticated)
    }

    /// The caller's profile; `NotFound` when they have not finished setup.
    pub async fn profile(&self) -> Result<Profile, DevPlayError> {
        let user = self.user().await?;
        let query = Query::table(Table::Profiles).eq("user_id", &user.id);
        select_maybe(self.data.as_ref(), &query)
            .await?
            .ok_or_else(|| DevPlayError::not_found("Profile", user.id.to_string()))
    }

    pub async fn profile_id(&self) -> Result<ProfileId, DevPlayError> {
        Ok(self.profile().await?.id)
    }

    /// Like [`profile_id`](Self::profile_id) but `None` for anonymous callers
    /// or callers without a profile.
    pub async fn viewer_id(&self) -> Result<Option<ProfileId>, DevPlayError> {
        match self.profile().await {
            Ok(p) => Ok(Some(p.id)),
            Err(DevPlayError::NotAuthenticated) => Ok(None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devplay_test_utils::fixtures::{profile_row, session_for};
    use devplay_test_utils::{MemoryStore, MockIdentity};

    #[tokio::test]
    async fn anonymous_caller_is_not_authenticated() {
        let current = CurrentProfile::new(Arc::new(MockIdentity::new()), Arc::new(MemoryStore::new()));
        assert!(matches!(
            current.profile().await.unwrap_err(),
            DevPlayError::NotAuthenticated
        ));
        assert!(current.viewer_id().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let current = CurrentProfile::new(
            Arc::new(MockIdentity::with_session(session_for("u1"))),
            Arc::new(MemoryStore::new()),
        );
        assert!(current.profile().await.unwrap_err().is_not_found());
        assert!(current.viewer_id().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolves_profile_id() {
        let data = Arc::new(MemoryStore::new());
        data.seed(Table::Profiles, profile_row("u1", "alice", "user")).await;
        let current = CurrentProfile::new(Arc::new(MockIdentity::with_session(session_for("u1"))), data);
        assert_eq!(current.profile_id().await.unwrap(), ProfileId::from("p-u1"));
    }
}
