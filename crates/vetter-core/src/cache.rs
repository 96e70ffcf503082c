//! Memoized, de-duplicated classification lookups.
//!
//! Every code passes through three states at most once per session:
//!
//! ```text
//!   (unknown) --request--> Pending --poll--> Hit(Classification)
//!                                      \---> Absent
//! ```
//!
//! A code that already has an entry is never fetched again, so any number of
//! `request(c)` calls made before the first lookup resolves produce exactly
//! one remote fetch. Failed lookups are recorded as `Absent` (the UI treats
//! that as "unknown, non-blocking") and reported to a [`FailureSink`]; there
//! is no retry and no eviction.

use crate::backend::{BackendError, ReviewBackend};
use crate::executor::{Executor, Inbox};
use crate::hierarchy::{self, HierarchyEntry};
use crate::model::Classification;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Cached state of one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// A lookup is in flight.
    Pending,
    /// The server knows this code.
    Hit(Classification),
    /// Confirmed miss, or a failed lookup that will not be retried.
    Absent,
}

impl CacheEntry {
    #[must_use]
    pub const fn classification(&self) -> Option<&Classification> {
        match self {
            Self::Hit(class) => Some(class),
            Self::Pending | Self::Absent => None,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Receives lookup failures that were absorbed by the cache.
pub trait FailureSink: Send + Sync {
    fn lookup_failed(&self, code: &str, err: &BackendError);
}

/// Default sink: a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn lookup_failed(&self, code: &str, err: &BackendError) {
        tracing::warn!(code, error_code = %err.code(), "classification lookup failed: {err}");
    }
}

type Completion = (String, Result<Option<Classification>, BackendError>);

pub struct ClassificationCache {
    backend: Arc<dyn ReviewBackend>,
    executor: Arc<dyn Executor>,
    sink: Arc<dyn FailureSink>,
    entries: HashMap<String, CacheEntry>,
    inbox: Inbox<Completion>,
}

impl ClassificationCache {
    pub fn new(backend: Arc<dyn ReviewBackend>, executor: Arc<dyn Executor>) -> Self {
        Self {
            backend,
            executor,
            sink: Arc::new(TracingSink),
            entries: HashMap::new(),
            inbox: Inbox::new(),
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Start a lookup for `code` unless it is already known or in flight.
    ///
    /// Returns `true` when a remote fetch was issued.
    pub fn request(&mut self, code: &str) -> bool {
        let code = code.trim();
        if code.is_empty() || self.entries.contains_key(code) {
            return false;
        }

        self.entries.insert(code.to_string(), CacheEntry::Pending);
        tracing::debug!(code, "classification lookup issued");

        let backend = Arc::clone(&self.backend);
        let owned = code.to_string();
        let fallback = owned.clone();
        self.inbox.dispatch(
            self.executor.as_ref(),
            move || {
                let result = backend.fetch_classification(&owned);
                (owned, result)
            },
            |err| (fallback, Err(BackendError::unscheduled(&err))),
        );
        true
    }

    /// [`Self::request`] for every code, each at most once. Returns how many
    /// fetches were issued.
    pub fn request_all<I, S>(&mut self, codes: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        codes
            .into_iter()
            .filter(|code| self.request(code.as_ref()))
            .count()
    }

    /// Request every ancestor prefix of `code`.
    pub fn request_chain(&mut self, code: &str) -> usize {
        self.request_all(hierarchy::resolve(code))
    }

    /// Current state of `code`; `None` if it was never requested.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&CacheEntry> {
        self.entries.get(code.trim())
    }

    #[must_use]
    pub fn classification(&self, code: &str) -> Option<&Classification> {
        self.get(code).and_then(CacheEntry::classification)
    }

    /// Labelled ancestor chain of `code` with whatever titles are cached.
    #[must_use]
    pub fn hierarchy(&self, code: &str) -> Vec<HierarchyEntry> {
        hierarchy::build_hierarchy(code, |prefix| self.classification(prefix).cloned())
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries.values().filter(|e| e.is_pending()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every completed lookup. Returns how many entries changed.
    pub fn poll(&mut self) -> usize {
        let completions = self.inbox.drain();
        let applied = completions.len();
        for completion in completions {
            self.apply(completion);
        }
        applied
    }

    /// Block until nothing is pending or `timeout` elapses. Returns `true`
    /// when the cache is fully settled.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        for completion in self.inbox.wait_all(timeout) {
            self.apply(completion);
        }
        self.pending() == 0
    }

    fn apply(&mut self, (code, result): Completion) {
        let entry = match result {
            Ok(Some(class)) => CacheEntry::Hit(class),
            Ok(None) => {
                tracing::debug!(code = %code, "classification not found");
                CacheEntry::Absent
            }
            Err(err) => {
                self.sink.lookup_failed(&code, &err);
                CacheEntry::Absent
            }
        };
        self.entries.insert(code, entry);
    }
}

impl std::fmt::Debug for ClassificationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationCache")
            .field("entries", &self.entries.len())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
