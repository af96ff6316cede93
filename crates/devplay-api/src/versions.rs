// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Release history for software listings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use devplay_core::models::SoftwareVersion;
use devplay_core::traits::data::{insert_as, select_all, select_maybe, select_one, update_one};
use devplay_core::{DataStore, DevPlayError, Query, Table};
use serde::Serialize;
use tracing::info;

use crate::validation::{validate_required, validate_url, validate_version};

/// `(software_id, version)` is already taken.
pub const MSG_VERSION_EXISTS: &str = "이미 존재하는 버전입니다.";

/// A release to publish under an existing listing.
#[derive(Debug, Clone, Serialize)]
pub struct CreateVersion {
    /// Listing the release belongs to.
    pub software_id: String,
    /// Release tag such as `v1.2.0`.
    pub version: String,
    /// Empty text is stored as none.
    pub changelog: Option<String>,
    /// Must parse as a URL.
    pub download_url: String,
    /// Defaults to now.
    pub release_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateVersion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
}

/// Release history per software listing.
pub struct VersionService {
    data: Arc<dyn DataStore>,
}

impl VersionService {
    pub fn new(data: Arc<dyn DataStore>) -> Self {
        Self { data }
    }

    /// Validates and publishes a release. Duplicates of an existing version fail.
    pub async fn create(&self, mut input: CreateVersion) -> Result<SoftwareVersion, DevPlayError> {
        validate_version(&input.version)?;
        validate_required(&input.download_url, "다운로드 URL")?;
        validate_url(&input.download_url, "다운로드 URL")?;
        self.ensure_unique(&input.software_id, &input.version, None)
            .await?;

        input.changelog = input.changelog.filter(|c| !c.is_empty());
        input.release_date.get_or_insert_with(Utc::now);
        let created: SoftwareVersion =
            insert_as(self.data.as_ref(), Table::SoftwareVersions, &input)
                .await
                .map_err(map_duplicate)?;
        info!(software_id = %created.software_id, version = %created.version, "version published");
        Ok(created)
    }

    /// Newest release first.
    pub async fn list(&self, software_id: &str) -> Result<Vec<SoftwareVersion>, DevPlayError> {
        select_all(self.data.as_ref(), &for_software(software_id)).await
    }

    pub async fn get(&self, id: &str) -> Result<SoftwareVersion, DevPlayError> {
        select_one(self.data.as_ref(), &by_id(id)).await
    }

    /// Most recent release by release date, if any.
    pub async fn latest(&self, software_id: &str) -> Result<Option<SoftwareVersion>, DevPlayError> {
        select_maybe(self.data.as_ref(), &for_software(software_id).limit(1)).await
    }

    pub async fn update(&self, id: &str, update: UpdateVersion) -> Result<SoftwareVersion, DevPlayError> {
        if let Some(version) = &update.version {
            validate_version(version)?;
            let current = self.get(id).await?;
            self.ensure_unique(&current.software_id, version, Some(id))
                .await?;
        }
        if let Some(url) = &update.download_url {
            validate_url(url, "다운로드 URL")?;
        }
        update_one(self.data.as_ref(), &by_id(id), &update)
            .await
            .map_err(map_duplicate)
    }

    pub async fn delete(&self, id: &str) -> Result<(), DevPlayError> {
        if self.data.delete(&by_id(id)).await? == 0 {
            return Err(DevPlayError::not_found("SoftwareVersion", id));
        }
        Ok(())
    }

    async fn ensure_unique(
        &self,
        software_id: &str,
        version: &str,
        except: Option<&str>,
    ) -> Result<(), DevPlayError> {
        let mut query = Query::table(Table::SoftwareVersions)
            .eq("software_id", software_id)
            .eq("version", version);
        if let Some(id) = except {
            query = query.neq("id", id);
        }
        if self.data.count(&query).await? > 0 {
            return Err(DevPlayError::validation("version", MSG_VERSION_EXISTS));
        }
        Ok(())
    }
}

fn map_duplicate(err: DevPlayError) -> DevPlayError {
    match err {
        DevPlayError::Conflict { .. } => DevPlayError::validation("version", MSG_VERSION_EXISTS),
        other => other,
    }
}

fn by_id(id: &str) -> Query {
    Query::table(Table::SoftwareVersions).eq("id", id)
}

fn for_software(software_id: &str) -> Query {
    Query::table(Table::SoftwareVersions)
        .eq("software_id", software_id)
        .order("release_date", false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use devplay_test_utils::MemoryStore;

    fn input(version: &str, day: u32) -> CreateVersion {
        CreateVersion {
            software_id: "s1".into(),
            version: version.into(),
            changelog: Some(String::new()),
            download_url: "https://downloads.example.com/s1.zip".into(),
            release_date: Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).single(),
        }
    }

    #[tokio::test]
    async fn create_list_latest() {
        let svc = VersionService::new(Arc::new(MemoryStore::new()));
        svc.create(input("v1.0.0", 1)).await.unwrap();
        let second = svc.create(input("1.1.0-beta", 5)).await.unwrap();
        assert!(second.changelog.is_none());

        let all = svc.list("s1").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].version, "1.1.0-beta");
        assert_eq!(svc.latest("s1").await.unwrap().unwrap().id, second.id);
        assert!(svc.latest("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_bad_format_and_duplicates() {
        let svc = VersionService::new(Arc::new(MemoryStore::new()));
        let err = svc.create(input("1.0", 1)).await.unwrap_err();
        assert_eq!(err.to_string(), crate::validation::MSG_VERSION_FORMAT);

        svc.create(input("v1.0.0", 1)).await.unwrap();
        let err = svc.create(input("v1.0.0", 2)).await.unwrap_err();
        assert_eq!(err.to_string(), MSG_VERSION_EXISTS);
    }

    #[tokio::test]
    async fn update_checks_duplicates_excluding_self() {
        let svc = VersionService::new(Arc::new(MemoryStore::new()));
        let a = svc.create(input("v1.0.0", 1)).await.unwrap();
        svc.create(input("v1.1.0", 2)).await.unwrap();

        let same = svc
            .update(
                &a.id,
                UpdateVersion {
                    version: Some("v1.0.0".into()),
                    changelog: Some("fixes".into()),
                    ..UpdateVersion::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.changelog.as_deref(), Some("fixes"));

        let err = svc
            .update(
                &a.id,
                UpdateVersion {
                    version: Some("v1.1.0".into()),
                    ..UpdateVersion::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), MSG_VERSION_EXISTS);

        svc.delete(&a.id).await.unwrap();
        assert!(svc.get(&a.id).await.unwrap_err().is_not_found());
    }
}
