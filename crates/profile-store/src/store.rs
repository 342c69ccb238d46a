use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::ProfileError;
use crate::schema::{self, Profile, STORAGE_KEY};

/// Collaborator the fill engine reads the applicant profile from.
pub trait ProfileStore: Send + Sync {
    /// Current profile; an error makes the whole fill pass fail.
    fn read(&self) -> Result<Profile, ProfileError>;

    fn write(&self, profile: &Profile) -> Result<(), ProfileError>;

    fn sanitize(&self, raw: &Value) -> Profile {
        schema::sanitize(raw)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEnvelope {
    #[serde(rename = "formFuseProfile", default)]
    profile: Value,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

/// JSON file persistence: `{ "formFuseProfile": {...}, "saved_at": ... }`.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the stored profile with the sanitized content of `raw`.
    pub fn import(&self, raw: &Value) -> Result<Profile, ProfileError> {
        let source = raw.get(STORAGE_KEY).unwrap_or(raw);
        let profile = self.sanitize(source);
        self.write(&profile)?;
        Ok(profile)
    }
}

impl ProfileStore for FileProfileStore {
    fn read(&self) -> Result<Profile, ProfileError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored profile, using defaults");
                return Ok(schema::default_profile());
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "profile read failed");
                return Err(ProfileError::Unavailable(err.to_string()));
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(schema::default_profile());
        }
        let envelope: StoredEnvelope = serde_json::from_slice(&bytes)
            .map_err(|err| ProfileError::Unavailable(format!("{err}")))?;
        Ok(self.sanitize(&envelope.profile))
    }

    fn write(&self, profile: &Profile) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let envelope = StoredEnvelope {
            profile: profile.to_json(),
            saved_at: Some(Utc::now()),
        };
        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(&self.path, bytes)?;
        debug!(path = %self.path.display(), "profile persisted");
        Ok(())
    }
}

/// In-process store; `unavailable()` simulates a storage failure.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    inner: RwLock<Option<Profile>>,
    fail_reads: bool,
}

impl MemoryProfileStore {
    pub fn new(profile: Profile) -> Self {
        Self {
            inner: RwLock::new(Some(profile)),
            fail_reads: false,
        }
    }

    pub fn from_json(raw: &Value) -> Self {
        Self::new(schema::sanitize(raw))
    }

    pub fn unavailable() -> Self {
        Self {
            inner: RwLock::new(None),
            fail_reads: true,
        }
    }
}

impl ProfileStore for MemoryProfileStore {
    fn read(&self) -> Result<Profile, ProfileError> {
        if self.fail_reads {
            return Err(ProfileError::Unavailable("storage offline".into()));
        }
        Ok(self
            .inner
            .read()
            .clone()
            .unwrap_or_else(schema::default_profile))
    }

    fn write(&self, profile: &Profile) -> Result<(), ProfileError> {
        *self.inner.write() = Some(profile.clone());
        Ok(())
    }
}
