//! Remote collaborators: the review queue, decision store and taxonomy.
//!
//! # Module layout
//!
//! - [`http`]: [`HttpBackend`], the `ureq` client for the review server.
//! - [`memory`]: [`MemoryBackend`], an in-process queue loaded from a JSON
//!   fixture, used for offline demos and tests.
//!
//! "Not found" is an expected answer and comes back as `Ok(None)`; only
//! genuine failures are [`BackendError`]s.

pub mod http;
pub mod memory;

pub use http::HttpBackend;
pub use memory::{Fixture, FixtureError, MemoryBackend};

use crate::error::ErrorCode;
use crate::model::{Classification, Decision, Item};

/// Errors returned by a [`ReviewBackend`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The server could not be reached at all.
    #[error("transport failure talking to {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("server returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The server's response could not be decoded.
    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// The in-memory backend refused the operation.
    #[error("{0}")]
    Rejected(String),

    /// The call never ran because no worker could be started for it.
    #[error("could not schedule remote call: {0}")]
    Unscheduled(String),
}

impl BackendError {
    /// Result for a call the executor refused to run.
    #[must_use]
    pub fn unscheduled(err: &std::io::Error) -> Self {
        Self::Unscheduled(err.to_string())
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport { .. } => ErrorCode::ServerUnreachable,
            Self::Status { .. } | Self::Rejected(_) => ErrorCode::ServerRejected,
            Self::Decode { .. } => ErrorCode::ResponseMalformed,
            Self::Unscheduled(_) => ErrorCode::InternalUnexpected,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Aggregate queue statistics as reported by the server. Opaque to the client.
pub type Stats = serde_json::Value;

/// The queue/decision/taxonomy collaborator consumed by a review session.
pub trait ReviewBackend: Send + Sync {
    /// Lock and return the next item for `reviewer_id`, or `None` when the
    /// queue has nothing left.
    fn fetch_next_item(
        &self,
        reviewer_id: &str,
        queue: Option<&str>,
    ) -> Result<Option<Item>, BackendError>;

    /// Persist a decision. On error the server-side item is unchanged.
    fn submit_decision(&self, decision: &Decision) -> Result<Item, BackendError>;

    fn fetch_classification(&self, code: &str) -> Result<Option<Classification>, BackendError>;

    /// Relevance-ordered search over the taxonomy.
    fn search_classifications(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Classification>, BackendError>;
}

/// Administrative and user-directory calls. These are passed straight through
/// to the server and never touch session state.
pub trait AdminBackend: Send + Sync {
    fn stats(&self, reviewer_id: Option<&str>) -> Result<Stats, BackendError>;
    fn unlock_item(&self, item_id: &str) -> Result<String, BackendError>;
    fn unlock_all(&self) -> Result<(String, u64), BackendError>;
    fn requeue_escalated(&self) -> Result<(String, u64), BackendError>;
    fn reset_stale_locks(&self, max_age_minutes: u32) -> Result<(String, u64), BackendError>;
    fn list_users(&self) -> Result<Vec<User>, BackendError>;
    /// Create a reviewer account. `Ok(false)` means the name already existed.
    fn create_user(&self, username: &str, role: &str) -> Result<(User, bool), BackendError>;
}

/// A reviewer account as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "reviewer".to_string()
}
