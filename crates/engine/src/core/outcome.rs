use crate::core::RawFinding;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Terminal state of one plugin invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

/// Result of one plugin's execution. One of these is produced per requested
/// plugin regardless of individual failures, so operators can always see
/// which scanners ran and which did not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginOutcome {
    pub plugin: String,

    pub status: OutcomeStatus,

    /// Present iff `status == Succeeded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<Vec<RawFinding>>,

    /// Present iff `status != Succeeded`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub duration: Duration,
}

impl PluginOutcome {
    pub fn succeeded(plugin: impl Into<String>, findings: Vec<RawFinding>, duration: Duration) -> Self {
        Self {
            plugin: plugin.into(),
            status: OutcomeStatus::Succeeded,
            findings: Some(findings),
            error: None,
            duration,
        }
    }

    pub fn failed(plugin: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            plugin: plugin.into(),
            status: OutcomeStatus::Failed,
            findings: None,
            error: Some(error.into()),
            duration,
        }
    }

    pub fn timed_out(plugin: impl Into<String>, budget: Duration) -> Self {
        Self {
            plugin: plugin.into(),
            status: OutcomeStatus::TimedOut,
            findings: None,
            error: Some(format!(
                "scan exceeded the {} second budget",
                budget.as_secs()
            )),
            duration: budget,
        }
    }

    pub fn cancelled(plugin: impl Into<String>, duration: Duration) -> Self {
        Self {
            plugin: plugin.into(),
            status: OutcomeStatus::Cancelled,
            findings: None,
            error: Some("scan cancelled by caller".to_string()),
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}
