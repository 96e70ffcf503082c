//! Wire-level data model shared with the review server.
//!
//! Field names follow the server's JSON (`meta_data`, `existing_code`, ...).
//! Items and classifications are immutable once received; a new item replaces
//! the old one wholesale.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

/// One unit of review work assigned by the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub description: String,
    #[serde(rename = "meta_data", default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub existing_code: Option<String>,
    #[serde(default)]
    pub existing_label: Option<String>,
    #[serde(default)]
    pub model_code: Option<String>,
    #[serde(default)]
    pub model_label: Option<String>,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_queue")]
    pub queue: String,
}

impl Item {
    /// Existing code, with empty strings treated as absent.
    #[must_use]
    pub fn existing(&self) -> Option<&str> {
        non_empty(self.existing_code.as_deref())
    }

    /// Model-predicted code, with empty strings treated as absent.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        non_empty(self.model_code.as_deref())
    }
}

/// A taxonomy entry keyed by its hierarchical code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub code: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub also_includes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<String>,
}

impl Classification {
    /// First `limit` bullet lines of the `includes` block.
    #[must_use]
    pub fn include_lines(&self, limit: usize) -> Vec<String> {
        bullet_lines(self.includes.as_deref(), limit)
    }

    /// First `limit` bullet lines of the `excludes` block.
    #[must_use]
    pub fn exclude_lines(&self, limit: usize) -> Vec<String> {
        bullet_lines(self.excludes.as_deref(), limit)
    }
}

/// What the reviewer decided to do with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Accept,
    Fix,
    Escalate,
}

impl DecisionAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Fix => "fix",
            Self::Escalate => "escalate",
        }
    }
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "fix" => Ok(Self::Fix),
            "escalate" => Ok(Self::Escalate),
            other => Err(format!("unknown decision action '{other}'")),
        }
    }
}

/// The single record submitted for an item. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub item_id: String,
    pub reviewer_id: String,
    pub action: DecisionAction,
    pub final_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
    pub time_spent_ms: u64,
}

fn default_status() -> String {
    "pending".to_string()
}

fn default_queue() -> String {
    "high_confidence".to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn bullet_lines(text: Option<&str>, limit: usize) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };
    text.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map_or(line, str::trim_start).to_string()
        })
        .filter(|line| !line.is_empty())
        .take(limit)
        .collect()
}
