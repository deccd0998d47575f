use crate::core::{Finding, OutcomeStatus, PluginOutcome, Severity};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Finding counts per severity tier, computed over the deduplicated list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeveritySummary {
    pub fn count(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }
}

/// The final artifact of a scan request. Immutable after construction;
/// returned to the caller, never retained by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub target: String,

    pub timestamp: DateTime<Utc>,

    /// One entry per requested plugin, kept verbatim for transparency.
    pub outcomes: Vec<PluginOutcome>,

    /// Deduplicated findings, severity descending, then resource, then rule.
    pub findings: Vec<Finding>,

    pub summary: SeveritySummary,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<String>,
}

impl Report {
    pub fn new(target: String, outcomes: Vec<PluginOutcome>, findings: Vec<Finding>) -> Self {
        let summary = SeveritySummary::count(&findings);
        Self {
            target,
            timestamp: Utc::now(),
            outcomes,
            findings,
            summary,
            enrichment: None,
        }
    }

    pub fn succeeded_plugins(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# IaC Scan Report\n\n");
        md.push_str(&format!("Target: `{}`\n\n", self.target));

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- Critical: {}\n", self.summary.critical));
        md.push_str(&format!("- High: {}\n", self.summary.high));
        md.push_str(&format!("- Medium: {}\n", self.summary.medium));
        md.push_str(&format!("- Low: {}\n", self.summary.low));
        md.push_str(&format!("- Info: {}\n\n", self.summary.info));

        md.push_str("## Scanners\n\n");
        for outcome in &self.outcomes {
            let status = match outcome.status {
                OutcomeStatus::Succeeded => "succeeded",
                OutcomeStatus::Failed => "failed",
                OutcomeStatus::TimedOut => "timed out",
                OutcomeStatus::Cancelled => "cancelled",
            };
            match &outcome.error {
                Some(error) => md.push_str(&format!(
                    "- `{}` {} in {:.1}s: {}\n",
                    outcome.plugin,
                    status,
                    outcome.duration.as_secs_f64(),
                    error
                )),
                None => md.push_str(&format!(
                    "- `{}` {} in {:.1}s\n",
                    outcome.plugin,
                    status,
                    outcome.duration.as_secs_f64()
                )),
            }
        }
        md.push('\n');

        if !self.findings.is_empty() {
            md.push_str("## Findings\n\n");
            for finding in &self.findings {
                md.push_str(&format!(
                    "### {} {}: {}\n\n",
                    finding.severity.emoji(),
                    finding.severity,
                    finding.title
                ));
                md.push_str(&format!("**Rule:** {}\n", finding.rule_id));
                if !finding.resource.is_empty() {
                    md.push_str(&format!("**Resource:** {}\n", finding.resource));
                }
                md.push_str(&format!(
                    "**Detected by:** {}\n\n",
                    finding.provenance.join(", ")
                ));
                if !finding.description.is_empty() {
                    md.push_str(&format!("{}\n\n", finding.description));
                }
                if let Some(remediation) = &finding.remediation {
                    md.push_str(&format!("**Remediation:** {}\n\n", remediation));
                }
                if let Some(location) = &finding.location {
                    match (location.line_start, location.line_end) {
                        (Some(start), Some(end)) => {
                            md.push_str(&format!("Location: {}:{}-{}\n\n", location.file, start, end))
                        }
                        _ => md.push_str(&format!("Location: {}\n\n", location.file)),
                    }
                }
            }
        }

        if let Some(enrichment) = &self.enrichment {
            md.push_str("## Analysis\n\n");
            md.push_str(enrichment);
            md.push('\n');
        }

        md
    }
}
