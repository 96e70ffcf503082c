//! Locally persisted reviewer preferences.
//!
//! Only two things are remembered between runs: the last reviewer identity
//! used on this machine and a per-reviewer daily target. Both are read when a
//! session starts and written only when the operator changes them.

use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Daily target used when a reviewer has never set one.
pub const DEFAULT_DAILY_TARGET: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("failed to read preferences at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preferences at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("failed to write preferences at {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("reviewer name must not be blank")]
    BlankReviewer,
}

impl PrefsError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Write { .. } => ErrorCode::PrefsWriteFailed,
            Self::Parse { .. } => ErrorCode::ConfigParseError,
            Self::BlankReviewer => ErrorCode::ReviewerMissing,
        }
    }
}

/// On-disk shape of `prefs.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewer: Option<String>,
    #[serde(default)]
    pub targets: BTreeMap<String, u32>,
}

impl Prefs {
    #[must_use]
    pub fn target_for(&self, reviewer_id: &str) -> u32 {
        self.targets
            .get(reviewer_id)
            .copied()
            .unwrap_or(DEFAULT_DAILY_TARGET)
    }
}

/// Key-value persistence for [`Prefs`].
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<Prefs, PrefsError>;
    fn save(&self, prefs: &Prefs) -> Result<(), PrefsError>;
}

/// `prefs.toml` under the vetter config directory.
#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
}

impl TomlFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/prefs.toml`.
    #[must_use]
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::new(config_dir.join("prefs.toml"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for TomlFileStore {
    fn load(&self) -> Result<Prefs, PrefsError> {
        if !self.path.exists() {
            return Ok(Prefs::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| PrefsError::Read {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|err| PrefsError::Parse {
            path: self.path.clone(),
            reason: err.to_string(),
        })
    }

    fn save(&self, prefs: &Prefs) -> Result<(), PrefsError> {
        let write_err = |reason: String| PrefsError::Write {
            path: self.path.clone(),
            reason,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let body = toml::to_string_pretty(prefs).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(&self.path, body).map_err(|e| write_err(e.to_string()))?;
        tracing::debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}

/// Non-persistent store for tests and offline runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    prefs: Mutex<Prefs>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(prefs: Prefs) -> Self {
        Self {
            prefs: Mutex::new(prefs),
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Result<Prefs, PrefsError> {
        Ok(self
            .prefs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, prefs: &Prefs) -> Result<(), PrefsError> {
        *self
            .prefs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = prefs.clone();
        Ok(())
    }
}

/// Who is reviewing, against which queue, towards which daily target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerProfile {
    pub reviewer_id: String,
    pub daily_target: u32,
    pub queue: Option<String>,
}

impl ReviewerProfile {
    /// Build a profile for `reviewer_id`, falling back to the last reviewer
    /// stored in `prefs`.
    pub fn resolve(
        reviewer_id: Option<&str>,
        queue: Option<&str>,
        prefs: &Prefs,
    ) -> Result<Self, PrefsError> {
        let reviewer_id = reviewer_id
            .or(prefs.last_reviewer.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(PrefsError::BlankReviewer)?
            .to_string();
        Ok(Self {
            daily_target: prefs.target_for(&reviewer_id),
            queue: queue
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            reviewer_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TomlFileStore::in_dir(dir.path());
        assert_eq!(store.load().expect("load"), Prefs::default());
    }

    #[test]
    fn file_store_persists_reviewer_and_targets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TomlFileStore::in_dir(&dir.path().join("nested"));

        let mut prefs = Prefs {
            last_reviewer: Some("sara".to_string()),
            ..Prefs::default()
        };
        prefs.targets.insert("sara".to_string(), 120);
        store.save(&prefs).expect("save");

        let raw = std::fs::read_to_string(store.path()).expect("read back");
        assert!(raw.contains("last_reviewer = \"sara\""));
        assert!(raw.contains("[targets]"));
        assert_eq!(store.load().expect("load"), prefs);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TomlFileStore::in_dir(dir.path());
        std::fs::write(store.path(), "last_reviewer = [").expect("write");
        let err = store.load().expect_err("must fail");
        assert!(matches!(err, PrefsError::Parse { .. }));
        assert_eq!(err.code(), ErrorCode::ConfigParseError);
    }

    #[test]
    fn profile_falls_back_to_last_reviewer() {
        let mut prefs = Prefs {
            last_reviewer: Some("omar".to_string()),
            ..Prefs::default()
        };
        prefs.targets.insert("omar".to_string(), 80);

        let profile = ReviewerProfile::resolve(None, Some(" "), &prefs).expect("profile");
        assert_eq!(profile.reviewer_id, "omar");
        assert_eq!(profile.daily_target, 80);
        assert_eq!(profile.queue, None);

        let explicit = ReviewerProfile::resolve(Some("lena"), Some("low_confidence"), &prefs)
            .expect("profile");
        assert_eq!(explicit.daily_target, DEFAULT_DAILY_TARGET);
        assert_eq!(explicit.queue.as_deref(), Some("low_confidence"));
    }

    #[test]
    fn profile_requires_a_reviewer() {
        let err = ReviewerProfile::resolve(Some("  "), None, &Prefs::default())
            .expect_err("blank reviewer");
        assert_eq!(err.code(), ErrorCode::ReviewerMissing);
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::default();
        let prefs = Prefs {
            last_reviewer: Some("kim".to_string()),
            ..Prefs::default()
        };
        store.save(&prefs).expect("save");
        assert_eq!(store.load().expect("load"), prefs);
    }
}
