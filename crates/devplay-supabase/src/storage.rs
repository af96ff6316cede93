// SPDX-FileCopyrightText: 2026 DevPlay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session persistence as a JSON file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use devplay_core::{DevPlayError, Session};
use tracing::{debug, warn};

/// Stores the current session at a fixed path.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous session intact.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session. A missing file is `None`; an unreadable one
    /// is discarded with a warning.
    pub async fn load(&self) -> Result<Option<Session>, DevPlayError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("read", &self.path, e)),
        };
        match serde_json::from_slice::<Session>(&bytes) {
            Ok(session) => {
                debug!(path = %self.path.display(), user_id = %session.user.id, "session restored from disk");
                Ok(Some(session))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt session file");
                self.clear().await?;
                Ok(None)
            }
        }
    }

    pub async fn save(&self, session: &Session) -> Result<(), DevPlayError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create directory for", &self.path, e))?;
        }
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| DevPlayError::Internal(format!("failed to encode session: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| io_error("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error("replace", &self.path, e))
    }

    /// Removes the stored session; missing files are fine.
    pub async fn clear(&self) -> Result<(), DevPlayError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &self.path, e)),
        }
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> DevPlayError {
    DevPlayError::Internal(format!(
        "failed to {action} session file {}: {e}",
        path.display()
    ))
}
