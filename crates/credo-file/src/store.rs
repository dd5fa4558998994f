//! JSON file credential store.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use credo_core::error::{Error, StorageError};
use credo_core::{AccessToken, CredentialSet, CredentialStore, RefreshToken, Result, TokenGrant, UserId};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Name of the credentials file inside the store directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Name of the lock file guarding cross-process access.
const LOCK_FILE: &str = "credentials.lock";

/// On-disk layout: exactly the four fields of a credential set.
///
/// Every field is optional when reading so a file with a missing field can be
/// recognised as malformed instead of failing to parse.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<String>,
}

impl StoredCredentials {
    fn from_set(set: &CredentialSet) -> Self {
        Self {
            user_id: Some(set.user_id().to_string()),
            access_token: Some(set.access_token().as_str().to_string()),
            refresh_token: set.refresh_token().map(|t| t.as_str().to_string()),
            expires_at: Some(set.expires_at().to_rfc3339()),
        }
    }

    /// Rebuild the credential set, or explain which field is unusable.
    fn into_set(self) -> std::result::Result<CredentialSet, &'static str> {
        let user_id = self
            .user_id
            .and_then(|id| UserId::new(id).ok())
            .ok_or("user_id")?;
        let access_token = self
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or("access_token")?;
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .ok_or("expires_at")?;
        let refresh_token = self
            .refresh_token
            .filter(|token| !token.is_empty())
            .map(RefreshToken::new);

        Ok(CredentialSet::new(
            user_id,
            TokenGrant::new(AccessToken::new(access_token), expires_at),
            refresh_token,
        ))
    }
}

/// Credential store persisting the set as a JSON file.
///
/// The file lives in a fixed directory per installation and is readable only
/// by its owner on Unix. Writes go to a temporary file that is renamed over
/// the previous one, so readers observe either the old or the new set. An
/// advisory lock file serialises access between processes.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Create a store in `dir`. The directory is created on first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the credentials file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    fn io_error(path: &Path, err: io::Error) -> Error {
        StorageError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
        .into()
    }

    /// Open the lock file, creating the store directory if needed.
    fn open_lock(&self) -> Result<File> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(&self.dir, e))?;

        let path = self.lock_path();
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| Self::io_error(&path, e))
    }

    fn lock_error(&self, err: io::Error) -> Error {
        StorageError::Lock {
            path: self.lock_path().display().to_string(),
            message: err.to_string(),
        }
        .into()
    }

    fn lock_shared(&self) -> Result<LockGuard> {
        let file = self.open_lock()?;
        FileExt::lock_shared(&file).map_err(|e| self.lock_error(e))?;
        Ok(LockGuard(file))
    }

    fn lock_exclusive(&self) -> Result<LockGuard> {
        let file = self.open_lock()?;
        FileExt::lock_exclusive(&file).map_err(|e| self.lock_error(e))?;
        Ok(LockGuard(file))
    }

    fn write_atomically(&self, json: &str) -> Result<()> {
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", CREDENTIALS_FILE, Uuid::new_v4()));

        if let Err(err) = write_private(&tmp_path, json).and_then(|()| fs::rename(&tmp_path, self.path())) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Self::io_error(&self.path(), err));
        }

        Ok(())
    }
}

/// Write `contents` to a new file readable only by its owner.
fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = File::create(path)?;

    // Restrict permissions before any secret is written (Unix only)
    #[cfg(unix)]
    file.set_permissions(fs::Permissions::from_mode(0o600))?;

    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

impl CredentialStore for FileCredentialStore {
    #[instrument(skip(self), fields(path = %self.path().display()))]
    fn load(&self) -> Result<Option<CredentialSet>> {
        if !self.dir.exists() {
            return Ok(None);
        }

        let _lock = self.lock_shared()?;

        let path = self.path();
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Self::io_error(&path, err)),
        };

        let stored: StoredCredentials = match serde_json::from_str(&json) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable credentials file");
                return Ok(None);
            }
        };

        match stored.into_set() {
            Ok(set) => {
                debug!(user_id = %set.user_id(), "Loaded credentials");
                Ok(Some(set))
            }
            Err(field) => {
                warn!(field, "Ignoring credentials file with missing or invalid field");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, set), fields(path = %self.path().display(), user_id = %set.user_id()))]
    fn save(&self, set: &CredentialSet) -> Result<()> {
        let json = serde_json::to_string_pretty(&StoredCredentials::from_set(set)).map_err(|e| {
            StorageError::Encode {
                message: e.to_string(),
            }
        })?;

        let _lock = self.lock_exclusive()?;
        self.write_atomically(&json)?;

        debug!("Saved credentials");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path().display()))]
    fn clear(&self) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }

        let _lock = self.lock_exclusive()?;

        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed credentials");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Self::io_error(&path, err)),
        }
    }
}

/// Releases the advisory lock when dropped.
struct LockGuard(File);

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.0);
    }
}
