// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Looks up the profile owned by an identity-provider user.

use std::sync::Arc;
use std::time::Duration;

use devplay_config::AuthConfig;
use devplay_core::traits::data::select_maybe;
use devplay_core::{DataStore, DevPlayError, Profile, Query, Table, UserId};
use tracing::debug;

/// Resolves `UserId -> Option<Profile>` with a bounded wait.
#[derive(Clone)]
pub struct ProfileResolver {
    data: Arc<dyn DataStore>,
    timeout: Duration,
}

impl ProfileResolver {
    pub fn new(data: Arc<dyn DataStore>, timeout: Duration) -> Self {
        Self { data, timeout }
    }

    pub fn from_config(data: Arc<dyn DataStore>, config: &AuthConfig) -> Self {
        Self::new(data, config.profile_query_timeout())
    }

    /// Zero matching rows is `Ok(None)`, the expected outcome for a new user.
    ///
    /// Transport and permission failures are returned as errors. More than
    /// one matching row is a [`DevPlayError::Integrity`] error.
    pub async fn resolve(&self, user_id: &UserId) -> Result<Option<Profile>, DevPlayError> {
        let query = Query::table(Table::Profiles).eq("user_id", user_id);
        let lookup = select_maybe::<Profile>(self.data.as_ref(), &query);

        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(profile)) => {
                debug!(user_id = %user_id, found = profile.is_some(), "profile lookup finished");
                Ok(profile)
            }
            Ok(Err(e)) if e.is_not_found() => {
                debug!(user_id = %user_id, "no profile rows");
                Ok(None)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DevPlayError::Timeout {
                duration: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devplay_core::error::CODE_NO_ROWS;
    use devplay_test_utils::MemoryStore;
    use devplay_test_utils::fixtures::profile_row;

    fn resolver(store: &Arc<MemoryStore>) -> ProfileResolver {
        ProfileResolver::new(store.clone(), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn finds_profile_by_user_id() {
        let store = Arc::new(MemoryStore::new());
        store.seed(Table::Profiles, profile_row("u1", "alice", "user")).await;
        let profile = resolver(&store).resolve(&UserId::from("u1")).await.unwrap();
        assert_eq!(profile.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn zero_rows_is_none() {
        let store = Arc::new(MemoryStore::new());
        let profile = resolver(&store).resolve(&UserId::from("nobody")).await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn no_rows_code_is_none() {
        let store = Arc::new(MemoryStore::new());
        store
            .fail_next(
                Table::Profiles,
                DevPlayError::Backend {
                    code: Some(CODE_NO_ROWS.into()),
                    message: "no rows".into(),
                },
            )
            .await;
        let profile = resolver(&store).resolve(&UserId::from("u1")).await.unwrap();
        assert!(profile.is_none());
    }

    #[tokio::test]
    async fn permission_failure_is_error() {
        let store = Arc::new(MemoryStore::new());
        store
            .fail_next(
                Table::Profiles,
                DevPlayError::PermissionDenied {
                    message: "JWT expired".into(),
                },
            )
            .await;
        let err = resolver(&store).resolve(&UserId::from("u1")).await.unwrap_err();
        assert!(matches!(err, DevPlayError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn duplicate_rows_are_integrity_error() {
        let store = Arc::new(MemoryStore::new().without_constraints());
        store.seed(Table::Profiles, profile_row("u1", "alice", "user")).await;
        store.seed(Table::Profiles, profile_row("u1", "alice2", "user")).await;
        let err = resolver(&store).resolve(&UserId::from("u1")).await.unwrap_err();
        assert!(matches!(err, DevPlayError::Integrity(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_times_out() {
        let store = Arc::new(MemoryStore::new());
        store
            .delay_select(Table::Profiles, "user_id", "u1", Duration::from_secs(60))
            .await;
        let err = resolver(&store).resolve(&UserId::from("u1")).await.unwrap_err();
        assert!(matches!(err, DevPlayError::Timeout { .. }));
    }
}
