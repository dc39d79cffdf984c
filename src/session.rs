//! The logged-in user, persisted as `{"type": ..., "id": ...}` in one file.
//!
//! The file is read once at startup, written on login and removed on logout.
//! Commands receive the [`Session`] explicitly rather than reading the file.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Client,
    Maalem,
    Admin,
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserKind::Client => "client",
            UserKind::Maalem => "maalem",
            UserKind::Admin => "admin",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(rename = "type")]
    pub kind: UserKind,
    pub id: u64,
}

#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    current: Option<CurrentUser>,
}

impl Session {
    /// Loads the session file. A missing file means logged out; an unreadable
    /// one is reported and treated the same way.
    pub async fn restore(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<CurrentUser>(&bytes) {
                Ok(user) => {
                    debug!(kind = %user.kind, id = user.id, "Session restored");
                    Some(user)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring corrupt session file");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read session file");
                None
            }
        };
        Self { path, current }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Option<CurrentUser> {
        self.current
    }

    /// Id of the logged-in user if they are of `kind`.
    pub fn require(&self, kind: UserKind) -> Result<u64, SessionError> {
        match self.current {
            None => Err(SessionError::NotLoggedIn),
            Some(user) if user.kind == kind => Ok(user.id),
            Some(user) => Err(SessionError::WrongRole {
                expected: kind.to_string(),
                actual: user.kind.to_string(),
            }),
        }
    }

    pub async fn login(&mut self, user: CurrentUser) -> Result<(), SessionError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| SessionError::Storage(format!("create {}: {e}", dir.display())))?;
        }
        let body = serde_json::to_vec(&user).map_err(|e| SessionError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| SessionError::Storage(format!("write {}: {e}", self.path.display())))?;
        info!(kind = %user.kind, id = user.id, "Logged in");
        self.current = Some(user);
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SessionError::Storage(format!("remove {}: {e}", self.path.display()))),
        }
        if let Some(user) = self.current.take() {
            info!(kind = %user.kind, id = user.id, "Logged out");
        }
        Ok(())
    }
}
