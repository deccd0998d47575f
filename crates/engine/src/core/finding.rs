use crate::core::Severity;
use serde::{Deserialize, Serialize};

/// Source location a plugin attached to a finding, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_start: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_end: Option<usize>,
}

impl Location {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line_start: None,
            line_end: None,
        }
    }

    pub fn with_lines(mut self, start: usize, end: usize) -> Self {
        self.line_start = Some(start);
        self.line_end = Some(end);
        self
    }
}

/// A finding exactly as a plugin backend reported it, before normalization.
///
/// The severity is the plugin's native string; the Aggregator translates it
/// through the plugin's severity table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFinding {
    pub rule_id: String,

    pub title: String,

    pub description: String,

    /// Best-effort resource identifier; may be empty when the backend does
    /// not attribute the issue to a specific resource.
    #[serde(default)]
    pub resource: String,

    pub native_severity: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl RawFinding {
    pub fn new(
        rule_id: impl Into<String>,
        title: impl Into<String>,
        native_severity: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            title: title.into(),
            description: String::new(),
            resource: String::new(),
            native_severity: native_severity.into(),
            remediation: None,
            location: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

/// One normalized detected issue in the canonical schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Plugin whose report this entry represents after deduplication.
    pub plugin: String,

    pub rule_id: String,

    pub severity: Severity,

    #[serde(default)]
    pub resource: String,

    pub title: String,

    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// Every plugin that detected this issue, representative included.
    /// Sorted, so identical inputs always produce identical reports.
    pub provenance: Vec<String>,
}

impl Finding {
    pub fn detected_by(&self, plugin: &str) -> bool {
        self.provenance.iter().any(|p| p == plugin)
    }
}
