//! In-process review backend.
//!
//! Mirrors the server's queue semantics closely enough for offline review,
//! demos and deterministic tests:
//!
//! - `fetch_next_item` returns the item the reviewer already holds a lock on,
//!   otherwise locks the first pending item (optionally restricted to a queue).
//! - `submit_decision` records the decision and marks the item `completed`
//!   (or `escalated`).
//! - Search is a case-insensitive substring match over code, title and intro,
//!   ordered by code, with the limit clamped to `1..=50`.
//!
//! Failure injection and call counters let tests exercise error paths without
//! a network.

use super::{AdminBackend, BackendError, ReviewBackend, Stats, User};
use crate::error::ErrorCode;
use crate::model::{Classification, Decision, DecisionAction, Item};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

const MAX_SEARCH_LIMIT: usize = 50;

/// Offline data set: queue items plus the taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub classifications: Vec<Classification>,
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, thiserror::Error)]
#[error("offline fixture {path} is invalid: {reason}")]
pub struct FixtureError {
    pub path: PathBuf,
    pub reason: String,
}

impl FixtureError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::FixtureInvalid
    }
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let invalid = |reason: String| FixtureError {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
    }
}

#[derive(Debug, Default)]
struct Inner {
    items: Vec<Item>,
    locks: HashMap<String, String>,
    taxonomy: BTreeMap<String, Classification>,
    users: Vec<User>,
    decisions: Vec<Decision>,
    classification_calls: HashMap<String, usize>,
    search_calls: usize,
    failing_codes: HashSet<String>,
    submit_failures: usize,
    fetch_failures: usize,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(fixture: Fixture) -> Self {
        let taxonomy = fixture
            .classifications
            .into_iter()
            .map(|class| (class.code.clone(), class))
            .collect();
        Self {
            inner: Mutex::new(Inner {
                items: fixture.items,
                taxonomy,
                users: fixture.users,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `n` decision submissions fail with a server error.
    pub fn fail_next_submissions(&self, n: usize) {
        self.lock().submit_failures = n;
    }

    /// Make the next `n` next-item fetches fail with a transport error.
    pub fn fail_next_fetches(&self, n: usize) {
        self.lock().fetch_failures = n;
    }

    /// Make every lookup of `code` fail with a server error.
    pub fn fail_lookups_for(&self, code: &str) {
        self.lock().failing_codes.insert(code.to_string());
    }

    /// How many times `fetch_classification(code)` was called.
    #[must_use]
    pub fn classification_calls(&self, code: &str) -> usize {
        self.lock()
            .classification_calls
            .get(code)
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn search_calls(&self) -> usize {
        self.lock().search_calls
    }

    /// Every decision accepted so far, in submission order.
    #[must_use]
    pub fn decisions(&self) -> Vec<Decision> {
        self.lock().decisions.clone()
    }

    /// Current server-side status of `item_id`.
    #[must_use]
    pub fn status_of(&self, item_id: &str) -> Option<String> {
        self.lock()
            .items
            .iter()
            .find(|item| item.id == item_id)
            .map(|item| item.status.clone())
    }
}

impl ReviewBackend for MemoryBackend {
    fn fetch_next_item(
        &self,
        reviewer_id: &str,
        queue: Option<&str>,
    ) -> Result<Option<Item>, BackendError> {
        let mut inner = self.lock();
        if inner.fetch_failures > 0 {
            inner.fetch_failures -= 1;
            return Err(BackendError::Transport {
                url: "memory://items/next".to_string(),
                reason: "simulated connection reset".to_string(),
            });
        }

        let held = inner
            .items
            .iter()
            .find(|item| {
                item.status == "locked"
                    && inner.locks.get(&item.id).map(String::as_str) == Some(reviewer_id)
            })
            .cloned();
        if held.is_some() {
            return Ok(held);
        }

        let Some(item) = inner
            .items
            .iter_mut()
            .find(|item| item.status == "pending" && queue.is_none_or(|q| item.queue == q))
        else {
            return Ok(None);
        };
        item.status = "locked".to_string();
        let item = item.clone();
        inner.locks.insert(item.id.clone(), reviewer_id.to_string());
        Ok(Some(item))
    }

    fn submit_decision(&self, decision: &Decision) -> Result<Item, BackendError> {
        let mut inner = self.lock();
        if inner.submit_failures > 0 {
            inner.submit_failures -= 1;
            return Err(BackendError::Status {
                url: "memory://decisions".to_string(),
                status: 500,
                body: "simulated failure".to_string(),
            });
        }

        let Some(item) = inner
            .items
            .iter_mut()
            .find(|item| item.id == decision.item_id)
        else {
            return Err(BackendError::Rejected(format!(
                "unknown item '{}'",
                decision.item_id
            )));
        };
        item.status = if decision.action == DecisionAction::Escalate {
            "escalated"
        } else {
            "completed"
        }
        .to_string();
        let item = item.clone();
        inner.locks.remove(&item.id);
        inner.decisions.push(decision.clone());
        Ok(item)
    }

    fn fetch_classification(&self, code: &str) -> Result<Option<Classification>, BackendError> {
        let mut inner = self.lock();
        *inner.classification_calls.entry(code.to_string()).or_default() += 1;
        if inner.failing_codes.contains(code) {
            return Err(BackendError::Status {
                url: format!("memory://classifications/{code}"),
                status: 503,
                body: "simulated outage".to_string(),
            });
        }
        Ok(inner.taxonomy.get(code).cloned())
    }

    fn search_classifications(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Classification>, BackendError> {
        let mut inner = self.lock();
        inner.search_calls += 1;
        let needle = query.trim().to_lowercase();
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        let matches = |class: &Classification| {
            needle.is_empty()
                || class.code.to_lowercase().contains(&needle)
                || class.title.to_lowercase().contains(&needle)
                || class
                    .intro
                    .as_deref()
                    .is_some_and(|intro| intro.to_lowercase().contains(&needle))
        };
        Ok(inner
            .taxonomy
            .values()
            .filter(|class| matches(*class))
            .take(limit)
            .cloned()
            .collect())
    }
}

impl AdminBackend for MemoryBackend {
    fn stats(&self, _reviewer_id: Option<&str>) -> Result<Stats, BackendError> {
        let inner = self.lock();
        let count = |status: &str| inner.items.iter().filter(|i| i.status == status).count();
        Ok(serde_json::json!({
            "total": inner.items.len(),
            "pending": count("pending"),
            "locked": count("locked"),
            "completed": count("completed"),
            "escalated": count("escalated"),
        }))
    }

    fn unlock_item(&self, item_id: &str) -> Result<String, BackendError> {
        let mut inner = self.lock();
        let Some(item) = inner
            .items
            .iter_mut()
            .find(|item| item.id == item_id && item.status == "locked")
        else {
            return Err(BackendError::Rejected(format!(
                "item '{item_id}' not found or not locked"
            )));
        };
        item.status = "pending".to_string();
        inner.locks.remove(item_id);
        Ok(format!("Item {item_id} unlocked"))
    }

    fn unlock_all(&self) -> Result<(String, u64), BackendError> {
        let mut inner = self.lock();
        let mut count = 0_u64;
        for item in inner.items.iter_mut().filter(|i| i.status == "locked") {
            item.status = "pending".to_string();
            count += 1;
        }
        inner.locks.clear();
        Ok((format!("Unlocked {count} items"), count))
    }

    fn requeue_escalated(&self) -> Result<(String, u64), BackendError> {
        let mut inner = self.lock();
        let mut count = 0_u64;
        for item in inner.items.iter_mut().filter(|i| i.status == "escalated") {
            item.status = "pending".to_string();
            count += 1;
        }
        Ok((format!("Requeued {count} escalated items"), count))
    }

    fn reset_stale_locks(&self, _max_age_minutes: u32) -> Result<(String, u64), BackendError> {
        // Offline locks carry no timestamps; nothing is ever stale.
        Ok(("Reset 0 stale locks".to_string(), 0))
    }

    fn list_users(&self) -> Result<Vec<User>, BackendError> {
        Ok(self.lock().users.clone())
    }

    fn create_user(&self, username: &str, role: &str) -> Result<(User, bool), BackendError> {
        let mut inner = self.lock();
        if let Some(existing) = inner.users.iter().find(|u| u.username == username) {
            return Ok((existing.clone(), false));
        }
        let user = User {
            username: username.to_string(),
            role: role.to_string(),
        };
        inner.users.push(user.clone());
        Ok((user, true))
    }
}
