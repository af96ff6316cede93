// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile lookups.

use std::collections::HashMap;
use std::sync::Arc;

use devplay_core::traits::data::{select_all, select_maybe};
use devplay_core::{AuthorSummary, DataStore, DevPlayError, Profile, ProfileId, Query, Table};

/// Read-only profile lookups.
pub struct ProfileService {
    data: Arc<dyn DataStore>,
}

impl ProfileService {
    pub fn new(data: Arc<dyn DataStore>) -> Self {
        Self { data }
    }

    pub async fn get_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, DevPlayError> {
        let query = Query::table(Table::Profiles).eq("id", id);
        select_maybe(self.data.as_ref(), &query).await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<Profile>, DevPlayError> {
        let query = Query::table(Table::Profiles).eq("username", username);
        select_maybe(self.data.as_ref(), &query).await
    }

    /// Whether any profile already uses `username`.
    pub async fn is_username_taken(&self, username: &str) -> Result<bool, DevPlayError> {
        let query = Query::table(Table::Profiles).eq("username", username);
        Ok(self.data.count(&query).await? > 0)
    }

    /// Display fields for every id in one round trip. Unknown ids are absent.
    pub async fn summaries<'a, I>(
        &self,
        ids: I,
    ) -> Result<HashMap<ProfileId, AuthorSummary>, DevPlayError>
    where
        I: IntoIterator<Item = &'a ProfileId>,
    {
        let mut wanted: Vec<&ProfileId> = ids.into_iter().collect();
        wanted.sort();
        wanted.dedup();
        if wanted.is_empty() {
            return Ok(HashMap::new());
        }
        let query = Query::table(Table::Profiles).in_list("id", wanted);
        let profiles: Vec<Profile> = select_all(self.data.as_ref(), &query).await?;
        Ok(profiles
            .iter()
            .map(|p| (p.id.clone(), AuthorSummary::from(p)))
            .collect())
    }
}
