// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role elevation requests and their admin review.

use std::sync::Arc;

use chrono::Utc;
use devplay_core::models::{RoleRequest, RoleRequestStatus};
use devplay_core::traits::data::{insert_as, select_all, select_one, update_one};
use devplay_core::{
    DataStore, DevPlayError, IdentityProvider, Profile, ProfileId, Query, Role, Table,
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::current::CurrentProfile;

/// A pending request for the same role already exists.
pub const MSG_ALREADY_PENDING: &str = "이미 대기 중인 요청이 있습니다.";
/// Review attempted by a non-admin.
pub const MSG_ADMIN_ONLY: &str = "관리자만 요청을 처리할 수 있습니다.";
/// The request is no longer pending.
pub const MSG_NOT_PENDING: &str = "이미 처리된 요청입니다.";

/// Whether `profile` may ask to become a developer.
pub fn can_request_developer(profile: &Profile, requests: &[RoleRequest]) -> bool {
    profile.role == Role::User
        && !requests
            .iter()
            .any(|r| r.is_pending() && r.requested_role == Role::Developer)
}

#[derive(Serialize)]
struct NewRoleRequest<'a> {
    user_id: &'a ProfileId,
    requested_role: Role,
    current_role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Files and reviews role elevation requests for the signed-in profile.
///
/// Reviews require the caller to be an admin.
pub struct RoleRequestService {
    data: Arc<dyn DataStore>,
    current: CurrentProfile,
}

impl RoleRequestService {
    pub fn new(identity: Arc<dyn IdentityProvider>, data: Arc<dyn DataStore>) -> Self {
        Self {
            current: CurrentProfile::new(identity, data.clone()),
            data,
        }
    }

    /// Files a request for `requested_role` on behalf of the caller.
    pub async fn create(
        &self,
        requested_role: Role,
        reason: Option<&str>,
    ) -> Result<RoleRequest, DevPlayError> {
        if requested_role == Role::User {
            return Err(DevPlayError::validation(
                "requested_role",
                "요청할 수 없는 역할입니다.",
            ));
        }
        let profile = self.current.profile().await?;
        let duplicate = self
            .for_profile(&profile)
            .await?
            .iter()
            .any(|r| r.is_pending() && r.requested_role == requested_role);
        if duplicate {
            return Err(DevPlayError::validation("requested_role", MSG_ALREADY_PENDING));
        }

        let row = NewRoleRequest {
            user_id: &profile.id,
            requested_role,
            current_role: profile.role,
            reason: reason.map(str::trim).filter(|r| !r.is_empty()),
        };
        let request: RoleRequest = insert_as(self.data.as_ref(), Table::RoleRequests, &row).await?;
        info!(request_id = %request.id, profile_id = %profile.id, role = %requested_role, "role requested");
        Ok(request)
    }

    /// The caller's requests, newest first.
    pub async fn mine(&self) -> Result<Vec<RoleRequest>, DevPlayError> {
        let profile = self.current.profile().await?;
        self.for_profile(&profile).await
    }

    /// Every request visible to the caller, newest first.
    pub async fn all(&self) -> Result<Vec<RoleRequest>, DevPlayError> {
        let query = Query::table(Table::RoleRequests).order("created_at", false);
        select_all(self.data.as_ref(), &query).await
    }

    /// The review queue, oldest first.
    pub async fn pending(&self) -> Result<Vec<RoleRequest>, DevPlayError> {
        let query = Query::table(Table::RoleRequests)
            .eq("status", RoleRequestStatus::Pending.to_string())
            .order("created_at", true);
        select_all(self.data.as_ref(), &query).await
    }

    /// Approves a pending request and grants the role.
    ///
    /// The request is marked approved before the requester's profile is
    /// changed; if the role update fails the request stays approved and
    /// the error is returned.
    pub async fn approve(&self, id: &str, notes: Option<&str>) -> Result<RoleRequest, DevPlayError> {
        let (reviewed, request) = self.review(id, RoleRequestStatus::Approved, notes).await?;

        let patch = json!({ "role": request.requested_role });
        let query = Query::table(Table::Profiles).eq("id", &request.user_id);
        let updated: Result<Profile, _> = update_one(self.data.as_ref(), &query, &patch).await;
        match updated {
            Ok(profile) => {
                info!(request_id = %id, profile_id = %profile.id, role = %profile.role, "role granted");
                Ok(reviewed)
            }
            Err(e) => {
                warn!(request_id = %id, error = %e, "role request approved but role update failed");
                Err(e)
            }
        }
    }

    pub async fn reject(&self, id: &str, notes: Option<&str>) -> Result<RoleRequest, DevPlayError> {
        let (reviewed, _) = self.review(id, RoleRequestStatus::Rejected, notes).await?;
        info!(request_id = %id, "role request rejected");
        Ok(reviewed)
    }

    /// Withdraws a request that has not been reviewed yet.
    pub async fn cancel(&self, id: &str) -> Result<(), DevPlayError> {
        let request = self.get(id).await?;
        if !request.is_pending() {
            return Err(DevPlayError::validation("status", MSG_NOT_PENDING));
        }
        self.data.delete(&by_id(id)).await?;
        info!(request_id = %id, "role request cancelled");
        Ok(())
    }

    /// Fails with `NotFound` for an unknown id.
    pub async fn get(&self, id: &str) -> Result<RoleRequest, DevPlayError> {
        select_one(self.data.as_ref(), &by_id(id)).await
    }

    async fn for_profile(&self, profile: &Profile) -> Result<Vec<RoleRequest>, DevPlayError> {
        let query = Query::table(Table::RoleRequests)
            .eq("user_id", &profile.id)
            .order("created_at", false);
        select_all(self.data.as_ref(), &query).await
    }

    /// Records an admin decision; returns the updated and the original request.
    async fn review(
        &self,
        id: &str,
        status: RoleRequestStatus,
        notes: Option<&str>,
    ) -> Result<(RoleRequest, RoleRequest), DevPlayError> {
        let reviewer = self.current.profile().await?;
        if reviewer.role != Role::Admin {
            return Err(DevPlayError::PermissionDenied {
                message: MSG_ADMIN_ONLY.to_string(),
            });
        }
        let request = self.get(id).await?;
        if !request.is_pending() {
            return Err(DevPlayError::validation("status", MSG_NOT_PENDING));
        }

        let patch = json!({
            "status": status,
            "admin_notes": notes,
            "reviewed_by": reviewer.id,
            "reviewed_at": Utc::now(),
        });
        let reviewed = update_one(self.data.as_ref(), &by_id(id), &patch).await?;
        Ok((reviewed, request))
    }
}

fn by_id(id: &str) -> Query {
    Query::table(Table::RoleRequests).eq("id", id)
}
