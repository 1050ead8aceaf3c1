use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::PlatformError;

/// `<site>.<env>` as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteEnvId {
    pub site: String,
    pub env: String,
}

impl FromStr for SiteEnvId {
    type Err = PlatformError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || PlatformError::InvalidSiteEnv {
            input: input.to_string(),
        };

        let (site, env) = input.trim().split_once('.').ok_or_else(invalid)?;
        if site.is_empty() || env.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            site: site.to_string(),
            env: env.to_string(),
        })
    }
}

impl fmt::Display for SiteEnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.site, self.env)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Site {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub name: String,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Status of a platform workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowStatus {
    Running,
    Succeeded,
    Failed,
    Unknown(String),
}

impl From<&str> for WorkflowStatus {
    fn from(result: &str) -> Self {
        match result {
            "running" => WorkflowStatus::Running,
            "succeeded" => WorkflowStatus::Succeeded,
            "failed" | "aborted" => WorkflowStatus::Failed,
            _ => WorkflowStatus::Unknown(result.to_string()),
        }
    }
}

impl WorkflowStatus {
    pub fn is_successful(&self) -> bool {
        matches!(self, WorkflowStatus::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, WorkflowStatus::Failed)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStatus::Running => write!(f, "running"),
            WorkflowStatus::Succeeded => write!(f, "succeeded"),
            WorkflowStatus::Failed => write!(f, "failed"),
            WorkflowStatus::Unknown(raw) => write!(f, "{raw}"),
        }
    }
}

/// A workflow as the waiter sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub id: String,
    /// Epoch seconds
    pub created_at: i64,
    pub description: String,
    /// `None` for site-level workflows
    pub environment: Option<String>,
    pub status: WorkflowStatus,
}

impl Workflow {
    pub fn is_successful(&self) -> bool {
        self.status.is_successful()
    }

    pub fn created_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.created_at, 0)
    }
}

/// Workflow record as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WorkflowRecord {
    pub id: String,
    #[serde(deserialize_with = "epoch_seconds")]
    pub created_at: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub finished_at: Option<f64>,
}

impl From<WorkflowRecord> for Workflow {
    fn from(record: WorkflowRecord) -> Self {
        let status = match (record.result.as_deref(), record.finished_at) {
            (Some(result), _) => WorkflowStatus::from(result),
            (None, None) => WorkflowStatus::Running,
            (None, Some(_)) => WorkflowStatus::Unknown("finished".to_string()),
        };

        Workflow {
            id: record.id,
            created_at: record.created_at,
            description: record.description.unwrap_or_default(),
            environment: record.environment,
            status,
        }
    }
}

// Timestamps come back as fractional epoch seconds.
fn epoch_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    Ok(seconds.trunc() as i64)
}
