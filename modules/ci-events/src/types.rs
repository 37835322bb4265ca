//! Event records as captured from CI webhooks. Read-only from this crate's side.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome classification of a CI run or one of its sub-tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    Pending,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "pending" => Ok(Self::Pending),
            other => Err(format!(
                "unknown outcome '{other}' (expected success, failure or pending)"
            )),
        }
    }
}

/// A single job or check inside a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub name: String,
    pub status: Outcome,
}

/// One captured CI activity. Optional fields are left out of rendered
/// messages when absent, so they are skipped on serialization too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<SubTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(id: impl Into<String>, outcome: Outcome, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            repository: None,
            workflow: None,
            branch: None,
            outcome,
            description: None,
            tasks: Vec::new(),
            log_url: None,
            pr_url: None,
            commit: None,
            timestamp,
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_workflow(mut self, workflow: impl Into<String>) -> Self {
        self.workflow = Some(workflow.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_task(mut self, name: impl Into<String>, status: Outcome) -> Self {
        self.tasks.push(SubTask {
            name: name.into(),
            status,
        });
        self
    }

    pub fn with_log_url(mut self, url: impl Into<String>) -> Self {
        self.log_url = Some(url.into());
        self
    }

    pub fn with_pr_url(mut self, url: impl Into<String>) -> Self {
        self.pr_url = Some(url.into());
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    /// First seven characters of the commit reference, the way chat clients
    /// and git short logs show it.
    pub fn short_commit(&self) -> Option<&str> {
        let commit = present(&self.commit)?;
        Some(match commit.char_indices().nth(7) {
            Some((idx, _)) => &commit[..idx],
            None => commit,
        })
    }

    /// Names of sub-tasks that ended with the given status, in capture order.
    pub fn tasks_with(&self, status: Outcome) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|t| t.status == status && !t.name.trim().is_empty())
            .map(|t| t.name.as_str())
            .collect()
    }
}

/// Treat empty and whitespace-only values as absent.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
