// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain services for DevPlay.
//!
//! Every service is written against [`DataStore`](devplay_core::DataStore);
//! services that act on behalf of the signed-in user also take the
//! [`IdentityProvider`](devplay_core::IdentityProvider) and resolve the
//! caller's profile through [`CurrentProfile`].

pub mod current;
pub mod profiles;
pub mod role_requests;
pub mod software;
pub mod threads;
pub mod validation;
pub mod versions;

pub use current::CurrentProfile;
pub use profiles::ProfileService;
pub use role_requests::{RoleRequestService, can_request_developer};
pub use software::{CreateSoftware, SoftwareFilter, SoftwareService, UpdateSoftware};
pub use threads::{
    CreateComment, CreateThread, ThreadListOptions, ThreadService, ThreadSort, UpdateThread,
};
pub use versions::{CreateVersion, UpdateVersion, VersionService};
