//! Blocking `ureq` client for the review server's JSON API.
//!
//! Calls block the calling thread; the session runs them on its executor so
//! the interactive thread never waits on the network.

use super::{AdminBackend, BackendError, ReviewBackend, Stats, User};
use crate::model::{Classification, Decision, Item};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("vetter/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct CountReply {
    message: String,
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct MessageReply {
    message: String,
}

impl HttpBackend {
    /// `base_url` is the API root, e.g. `http://localhost:8000/api`.
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issue `request`, mapping 404 to `None`.
    fn optional<T: DeserializeOwned>(
        url: &str,
        request: ureq::Request,
    ) -> Result<Option<T>, BackendError> {
        match request.call() {
            Ok(response) => decode(url, response).map(Some),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(err) => Err(map_error(url, err)),
        }
    }

    fn required<T: DeserializeOwned>(url: &str, request: ureq::Request) -> Result<T, BackendError> {
        match request.call() {
            Ok(response) => decode(url, response),
            Err(err) => Err(map_error(url, err)),
        }
    }

    fn post_count(url: &str, request: ureq::Request) -> Result<(String, u64), BackendError> {
        let reply: CountReply = Self::required(url, request)?;
        Ok((reply.message, reply.count))
    }
}

impl ReviewBackend for HttpBackend {
    fn fetch_next_item(
        &self,
        reviewer_id: &str,
        queue: Option<&str>,
    ) -> Result<Option<Item>, BackendError> {
        let url = self.url("items/next");
        let mut request = self.agent.get(&url).query("user_id", reviewer_id);
        if let Some(queue) = queue {
            request = request.query("queue", queue);
        }
        Self::optional(&url, request)
    }

    fn submit_decision(&self, decision: &Decision) -> Result<Item, BackendError> {
        let url = self.url("decisions");
        match self.agent.post(&url).send_json(decision) {
            Ok(response) => decode(&url, response),
            Err(err) => Err(map_error(&url, err)),
        }
    }

    fn fetch_classification(&self, code: &str) -> Result<Option<Classification>, BackendError> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }
        let url = self.url(&format!("classifications/{}", encode_segment(code)));
        Self::optional(&url, self.agent.get(&url))
    }

    fn search_classifications(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Classification>, BackendError> {
        let url = self.url("classifications");
        let request = self
            .agent
            .get(&url)
            .query("query", query)
            .query("limit", &limit.to_string());
        Self::required(&url, request)
    }
}

impl AdminBackend for HttpBackend {
    fn stats(&self, reviewer_id: Option<&str>) -> Result<Stats, BackendError> {
        let url = self.url("stats");
        let mut request = self.agent.get(&url);
        if let Some(reviewer_id) = reviewer_id {
            request = request.query("user_id", reviewer_id);
        }
        Self::required(&url, request)
    }

    fn unlock_item(&self, item_id: &str) -> Result<String, BackendError> {
        let url = self.url(&format!("unlock/{}", encode_segment(item_id)));
        let reply: MessageReply = Self::required(&url, self.agent.post(&url))?;
        Ok(reply.message)
    }

    fn unlock_all(&self) -> Result<(String, u64), BackendError> {
        let url = self.url("unlock-all");
        Self::post_count(&url, self.agent.post(&url))
    }

    fn requeue_escalated(&self) -> Result<(String, u64), BackendError> {
        let url = self.url("requeue-escalated");
        Self::post_count(&url, self.agent.post(&url))
    }

    fn reset_stale_locks(&self, max_age_minutes: u32) -> Result<(String, u64), BackendError> {
        let url = self.url("reset-stale-locks");
        let request = self
            .agent
            .post(&url)
            .query("max_age_minutes", &max_age_minutes.to_string());
        Self::post_count(&url, request)
    }

    fn list_users(&self) -> Result<Vec<User>, BackendError> {
        let url = self.url("users");
        Self::required(&url, self.agent.get(&url))
    }

    fn create_user(&self, username: &str, role: &str) -> Result<(User, bool), BackendError> {
        let url = self.url("users");
        let body = serde_json::json!({ "username": username, "role": role });
        match self.agent.post(&url).send_json(body) {
            Ok(response) => decode(&url, response).map(|user| (user, true)),
            Err(ureq::Error::Status(status @ (400 | 409), response)) => {
                let body = response.into_string().unwrap_or_default();
                if body.to_ascii_lowercase().contains("exist") {
                    tracing::warn!(
                        username,
                        "user already exists on server; continuing under that name"
                    );
                    let user = User {
                        username: username.to_string(),
                        role: role.to_string(),
                    };
                    Ok((user, false))
                } else {
                    Err(BackendError::Status { url, status, body })
                }
            }
            Err(err) => Err(map_error(&url, err)),
        }
    }
}

fn decode<T: DeserializeOwned>(url: &str, response: ureq::Response) -> Result<T, BackendError> {
    response.into_json::<T>().map_err(|err| BackendError::Decode {
        url: url.to_string(),
        reason: err.to_string(),
    })
}

fn map_error(url: &str, err: ureq::Error) -> BackendError {
    match err {
        ureq::Error::Status(status, response) => BackendError::Status {
            url: url.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => BackendError::Transport {
            url: url.to_string(),
            reason: transport.to_string(),
        },
    }
}

/// Percent-encode one URL path segment (RFC 3986 unreserved set kept as-is).
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
