// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Software catalog: listings owned by developer profiles.

use std::collections::HashMap;
use std::sync::Arc;

use devplay_core::models::{Software, SoftwareWithDeveloper};
use devplay_core::traits::data::{insert_as, select_all, select_one, update_one};
use devplay_core::{DataStore, DevPlayError, IdentityProvider, ProfileId, Query, Table};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::current::CurrentProfile;
use crate::profiles::ProfileService;
use crate::validation::{validate_required, validate_url};

const FIELD_NAME: &str = "이름";
const FIELD_DESCRIPTION: &str = "설명";
const FIELD_CATEGORY: &str = "카테고리";
const FIELD_DOWNLOAD_URL: &str = "다운로드 URL";
const FIELD_GITHUB_URL: &str = "GitHub URL";
const FIELD_IMAGE_URL: &str = "이미지 URL";

/// Tags returned by `popular_tags` when the caller has no preference.
pub const DEFAULT_TAG_LIMIT: usize = 20;

/// Form input for a new listing. The developer is the signed-in profile.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateSoftware {
    /// Display name; required.
    pub name: String,
    /// Required.
    pub description: String,
    /// Free-form category; required.
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Where the build is downloaded from; must parse as a URL.
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
}

impl CreateSoftware {
    fn validate(&self) -> Result<(), DevPlayError> {
        validate_required(&self.name, FIELD_NAME)?;
        validate_required(&self.description, FIELD_DESCRIPTION)?;
        validate_required(&self.category, FIELD_CATEGORY)?;
        validate_required(&self.download_url, FIELD_DOWNLOAD_URL)?;
        validate_url(&self.download_url, FIELD_DOWNLOAD_URL)?;
        validate_optional_url(self.github_url.as_deref(), FIELD_GITHUB_URL)?;
        validate_optional_url(self.image_url.as_deref(), FIELD_IMAGE_URL)
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateSoftware {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
}

impl UpdateSoftware {
    fn validate(&self) -> Result<(), DevPlayError> {
        let required = [
            (&self.name, FIELD_NAME),
            (&self.description, FIELD_DESCRIPTION),
            (&self.category, FIELD_CATEGORY),
            (&self.download_url, FIELD_DOWNLOAD_URL),
        ];
        for (value, field) in required {
            if let Some(v) = value {
                validate_required(v, field)?;
            }
        }
        validate_optional_url(self.download_url.as_deref(), FIELD_DOWNLOAD_URL)?;
        validate_optional_url(self.github_url.as_deref(), FIELD_GITHUB_URL)?;
        validate_optional_url(self.image_url.as_deref(), FIELD_IMAGE_URL)
    }
}

fn validate_optional_url(value: Option<&str>, field: &str) -> Result<(), DevPlayError> {
    match value {
        Some(v) if !v.is_empty() => validate_url(v, field),
        _ => Ok(()),
    }
}

/// Listing filters; all set fields must match.
#[derive(Debug, Clone, Default)]
pub struct SoftwareFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Matches listings sharing at least one tag.
    pub tags: Vec<String>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    /// Only listings owned by this profile.
    pub developer_id: Option<ProfileId>,
}

#[derive(Serialize)]
struct NewSoftware<'a> {
    #[serde(flatten)]
    fields: &'a CreateSoftware,
    developer_id: &'a ProfileId,
}

/// The software catalog.
///
/// Listings carry their developer's summary. Archived rows are hidden from
/// listings but stay reachable by id.
pub struct SoftwareService {
    data: Arc<dyn DataStore>,
    current: CurrentProfile,
    profiles: ProfileService,
}

impl SoftwareService {
    pub fn new(identity: Arc<dyn IdentityProvider>, data: Arc<dyn DataStore>) -> Self {
        Self {
            current: CurrentProfile::new(identity, data.clone()),
            profiles: ProfileService::new(data.clone()),
            data,
        }
    }

    /// Publishes a listing owned by the caller.
    pub async fn create(&self, input: CreateSoftware) -> Result<SoftwareWithDeveloper, DevPlayError> {
        input.validate()?;
        let developer_id = self.current.profile_id().await?;
        let row = NewSoftware {
            fields: &input,
            developer_id: &developer_id,
        };
        let software: Software = insert_as(self.data.as_ref(), Table::Softwares, &row).await?;
        info!(software_id = %software.id, developer_id = %developer_id, "software created");
        self.with_developer(software).await
    }

    /// Non-archived listings, newest first.
    pub async fn list(&self, filter: &SoftwareFilter) -> Result<Vec<SoftwareWithDeveloper>, DevPlayError> {
        let mut query = Query::table(Table::Softwares).eq("is_archived", false);
        if let Some(category) = &filter.category {
            query = query.eq("category", category.as_str());
        }
        if !filter.tags.is_empty() {
            query = query.overlaps("tags", filter.tags.iter().cloned());
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            query = query.ilike_any(&["name", "description"], search);
        }
        if let Some(dev) = &filter.developer_id {
            query = query.eq("developer_id", dev);
        }
        let rows: Vec<Software> =
            select_all(self.data.as_ref(), &query.order("created_at", false)).await?;
        debug!(count = rows.len(), "software listed");
        self.attach_developers(rows).await
    }

    /// Fails with `NotFound` for an unknown id, archived or not.
    pub async fn get(&self, id: &str) -> Result<SoftwareWithDeveloper, DevPlayError> {
        let software: Software = select_one(self.data.as_ref(), &by_id(id)).await?;
        self.with_developer(software).await
    }

    pub async fn update(
        &self,
        id: &str,
        update: UpdateSoftware,
    ) -> Result<SoftwareWithDeveloper, DevPlayError> {
        update.validate()?;
        let software: Software = update_one(self.data.as_ref(), &by_id(id), &update).await?;
        info!(software_id = %id, "software updated");
        self.with_developer(software).await
    }

    /// Hides a listing from the catalog without deleting it.
    pub async fn archive(&self, id: &str) -> Result<Software, DevPlayError> {
        let patch = serde_json::json!({ "is_archived": true });
        let software = update_one(self.data.as_ref(), &by_id(id), &patch).await?;
        info!(software_id = %id, "software archived");
        Ok(software)
    }

    /// Removes the listing outright; see [`SoftwareService::archive`] to hide it instead.
    pub async fn delete(&self, id: &str) -> Result<(), DevPlayError> {
        if self.data.delete(&by_id(id)).await? == 0 {
            return Err(DevPlayError::not_found("Software", id));
        }
        info!(software_id = %id, "software deleted");
        Ok(())
    }

    /// The caller's listings, archived ones included, newest first.
    pub async fn mine(&self) -> Result<Vec<SoftwareWithDeveloper>, DevPlayError> {
        let developer_id = self.current.profile_id().await?;
        let query = Query::table(Table::Softwares)
            .eq("developer_id", &developer_id)
            .order("created_at", false);
        let rows: Vec<Software> = select_all(self.data.as_ref(), &query).await?;
        self.attach_developers(rows).await
    }

    /// Distinct categories of live listings, in first-seen order.
    pub async fn categories(&self) -> Result<Vec<String>, DevPlayError> {
        let rows = self.live_rows().await?;
        let mut seen = Vec::new();
        for category in rows.iter().filter_map(|r| r.get("category").and_then(Value::as_str)) {
            if !seen.iter().any(|c| c == category) {
                seen.push(category.to_string());
            }
        }
        Ok(seen)
    }

    /// Most used tags, most frequent first; ties keep first-seen order.
    pub async fn popular_tags(&self, limit: usize) -> Result<Vec<String>, DevPlayError> {
        let rows = self.live_rows().await?;
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        let tags = rows
            .iter()
            .filter_map(|r| r.get("tags").and_then(Value::as_array))
            .flatten()
            .filter_map(Value::as_str);
        for tag in tags {
            let n = counts.entry(tag.to_string()).or_insert(0);
            if *n == 0 {
                order.push(tag.to_string());
            }
            *n += 1;
        }
        order.sort_by_key(|t| std::cmp::Reverse(counts.get(t).copied().unwrap_or(0)));
        order.truncate(limit);
        Ok(order)
    }

    async fn live_rows(&self) -> Result<Vec<Value>, DevPlayError> {
        self.data
            .select(&Query::table(Table::Softwares).eq("is_archived", false))
            .await
    }

    async fn with_developer(&self, software: Software) -> Result<SoftwareWithDeveloper, DevPlayError> {
        let mut out = self.attach_developers(vec![software]).await?;
        out.pop()
            .ok_or_else(|| DevPlayError::Internal("developer attach dropped a row".into()))
    }

    async fn attach_developers(
        &self,
        rows: Vec<Software>,
    ) -> Result<Vec<SoftwareWithDeveloper>, DevPlayError> {
        let devs = self
            .profiles
            .summaries(rows.iter().map(|s| &s.developer_id))
            .await?;
        Ok(rows
            .into_iter()
            .map(|software| SoftwareWithDeveloper {
                developer: devs.get(&software.developer_id).cloned(),
                software,
            })
            .collect())
    }
}

fn by_id(id: &str) -> Query {
    Query::table(Table::Softwares).eq("id", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devplay_test_utils::fixtures::{profile_row, session_for, software_row};
    use devplay_test_utils::{MemoryStore, MockIdentity};
    use serde_json::json;

    async fn service() -> (Arc<MemoryStore>, SoftwareService) {
        let data = Arc::new(MemoryStore::new());
        data.seed(Table::Profiles, profile_row("u1", "alice", "developer")).await;
        let identity = Arc::new(MockIdentity::with_session(session_for("u1")));
        (data.clone(), SoftwareService::new(identity, data))
    }

    fn input(name: &str) -> CreateSoftware {
        CreateSoftware {
            name: name.into(),
            description: "a tiny game".into(),
            category: "game".into(),
            tags: Some(vec!["rust".into()]),
            download_url: "https://downloads.example.com/app.zip".into(),
            ..CreateSoftware::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_caller_as_developer() {
        let (_data, svc) = service().await;
        let created = svc.create(input("Pong")).await.unwrap();
        assert_eq!(created.software.developer_id, ProfileId::from("p-u1"));
        assert_eq!(created.developer.unwrap().username, "alice");
        assert!(!created.software.is_archived);
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let (_data, svc) = service().await;
        let err = svc
            .create(CreateSoftware {
                download_url: "not a url".into(),
                ..input("Pong")
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = svc.create(input(" ")).await.unwrap_err();
        assert_eq!(err.to_string(), "이름을(를) 입력해주세요.");
    }

    #[tokio::test]
    async fn list_filters_and_hides_archived() {
        let (data, svc) = service().await;
        data.seed(Table::Softwares, software_row("s1", "p-u1", "Snake")).await;
        data.seed(Table::Softwares, software_row("s2", "p-u1", "Tetris")).await;
        let mut archived = software_row("s3", "p-u1", "Snake Classic");
        archived["is_archived"] = json!(true);
        data.seed(Table::Softwares, archived).await;

        let all = svc.list(&SoftwareFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let found = svc
            .list(&SoftwareFilter {
                search: Some("SNAKE".into()),
                ..SoftwareFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].software.id, "s1");

        let tagged = svc
            .list(&SoftwareFilter {
                tags: vec!["indie".into(), "other".into()],
                ..SoftwareFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(tagged.len(), 2);
    }

    #[tokio::test]
    async fn archive_then_mine_still_lists_it() {
        let (data, svc) = service().await;
        data.seed(Table::Softwares, software_row("s1", "p-u1", "Snake")).await;
        assert!(svc.archive("s1").await.unwrap().is_archived);
        assert!(svc.list(&SoftwareFilter::default()).await.unwrap().is_empty());
        assert_eq!(svc.mine().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete() {
        let (data, svc) = service().await;
        data.seed(Table::Softwares, software_row("s1", "p-u1", "Snake")).await;
        let updated = svc
            .update(
                "s1",
                UpdateSoftware {
                    name: Some("Snake II".into()),
                    ..UpdateSoftware::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.software.name, "Snake II");

        svc.delete("s1").await.unwrap();
        assert!(svc.get("s1").await.unwrap_err().is_not_found());
        assert!(svc.delete("s1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn categories_and_popular_tags() {
        let (data, svc) = service().await;
        let mut a = software_row("s1", "p-u1", "A");
        a["tags"] = json!(["rust", "cli"]);
        let mut b = software_row("s2", "p-u1", "B");
        b["category"] = json!("tool");
        b["tags"] = json!(["cli", "web"]);
        let mut c = software_row("s3", "p-u1", "C");
        c["tags"] = json!(["web", "cli"]);
        for row in [a, b, c] {
            data.seed(Table::Softwares, row).await;
        }

        assert_eq!(svc.categories().await.unwrap(), vec!["game", "tool"]);
        assert_eq!(svc.popular_tags(2).await.unwrap(), vec!["cli", "web"]);
        assert_eq!(
            svc.popular_tags(DEFAULT_TAG_LIMIT).await.unwrap(),
            vec!["cli", "web", "rust"]
        );
    }
}
