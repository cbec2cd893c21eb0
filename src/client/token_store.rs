//! Where the client keeps the bearer token and the identity that came with it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::Role;
use crate::registry::types::LoginResponse;

const LOG_TARGET: &str = "client::token_store";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredIdentity {
    pub token: String,
    pub role: Role,
    pub email: String,
    pub name: String,
}

impl From<LoginResponse> for StoredIdentity {
    fn from(login: LoginResponse) -> Self {
        Self {
            token: login.token,
            role: login.role,
            email: login.email,
            name: login.name,
        }
    }
}

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<StoredIdentity>;
    fn save(&self, identity: &StoredIdentity) -> io::Result<()>;
    fn clear(&self);
}

/// Lives as long as the process, like a browser tab's session storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: RwLock<Option<StoredIdentity>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<StoredIdentity> {
        self.inner.read().clone()
    }

    fn save(&self, identity: &StoredIdentity) -> io::Result<()> {
        *self.inner.write() = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) {
        self.inner.write().take();
    }
}

/// JSON file on disk so the CLI keeps its session between invocations.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<StoredIdentity> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(target: LOG_TARGET, path = %self.path.display(), error = %err, "failed to read session file");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(identity) => Some(identity),
            Err(err) => {
                debug!(target: LOG_TARGET, path = %self.path.display(), error = %err, "ignoring malformed session file");
                None
            }
        }
    }

    fn save(&self, identity: &StoredIdentity) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(identity)?;
        fs::write(&self.path, json)
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(target: LOG_TARGET, path = %self.path.display(), "session file removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(target: LOG_TARGET, path = %self.path.display(), error = %err, "failed to remove session file")
            }
        }
    }
}
