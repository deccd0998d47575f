//! Zodiac backend: drives the Zodiac semantic checker for cloud IaC and
//! adapts its YAML report.
//!
//! Configuration keys:
//! - `zodiac_path`: local path to a Zodiac checkout (must contain `main.py`)
//!
//! Zodiac reports a `violations` list; each entry carries a check id, a
//! message, the offending resource, and one of the native severities
//! `violation`/`warning`/`notice`/`info`, mapped High/Medium/Low/Info.

use crate::core::{
    Location, Plugin, PluginCapabilities, PluginConfig, PluginDescriptor, PluginError, RawFinding,
    Severity,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

pub const ZODIAC_SEVERITIES: &[(&str, Severity)] = &[
    ("violation", Severity::High),
    ("warning", Severity::Medium),
    ("notice", Severity::Low),
    ("info", Severity::Info),
];

pub struct ZodiacPlugin {
    zodiac_path: Option<PathBuf>,
}

impl ZodiacPlugin {
    pub fn new(config: PluginConfig) -> Self {
        Self {
            zodiac_path: config
                .get("zodiac_path")
                .and_then(|v| v.as_str())
                .map(PathBuf::from),
        }
    }

    pub fn descriptor() -> PluginDescriptor {
        PluginDescriptor {
            name: "zodiac",
            description: "Unearthing semantic checks for cloud IaC",
            default_config: PluginConfig::new(),
            capabilities: PluginCapabilities {
                supports: ["terraform", "cloudformation"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                features: ["semantic_checks", "invariant_mining"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            severity_map: ZODIAC_SEVERITIES,
        }
    }

    fn installation(&self) -> Result<&Path, PluginError> {
        let path = self.zodiac_path.as_deref().ok_or_else(|| {
            PluginError::InvalidConfig("zodiac_path is not configured".to_string())
        })?;
        if !path.join("main.py").is_file() {
            return Err(PluginError::InvalidConfig(format!(
                "no Zodiac installation at {}",
                path.display()
            )));
        }
        Ok(path)
    }
}

#[async_trait]
impl Plugin for ZodiacPlugin {
    fn name(&self) -> &'static str {
        "zodiac"
    }

    fn description(&self) -> &'static str {
        "Unearthing semantic checks for cloud IaC"
    }

    fn capabilities(&self) -> PluginCapabilities {
        Self::descriptor().capabilities
    }

    async fn validate_config(&self) -> Result<(), PluginError> {
        self.installation().map(|_| ())
    }

    async fn scan(&self, path: &Path) -> Result<Vec<RawFinding>, PluginError> {
        let installation = self.installation()?;
        // Removed on drop, which also covers the scan future being dropped
        // by a timeout or cancellation mid-run.
        let scratch = scratch_report_file()?;

        let result = Command::new("python3")
            .arg(installation.join("main.py"))
            .arg("--input")
            .arg(path)
            .arg("--output")
            .arg(scratch.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PluginError::ExecutionError(format!("failed to run zodiac: {}", e)))?;

        if !result.status.success() {
            return Err(PluginError::ExecutionError(format!(
                "zodiac exited with {}: {}",
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        let raw = tokio::fs::read_to_string(scratch.path()).await.map_err(|e| {
            PluginError::ExecutionError(format!("zodiac produced no report: {}", e))
        })?;

        let findings = parse_zodiac_report(&raw)
            .map_err(|e| PluginError::ExecutionError(format!("unparseable zodiac YAML: {}", e)))?;
        debug!(findings = findings.len(), "zodiac scan parsed");
        Ok(findings)
    }
}

#[derive(Debug, Deserialize)]
struct ZodiacReport {
    #[serde(default)]
    violations: Vec<ZodiacViolation>,
}

#[derive(Debug, Deserialize)]
struct ZodiacViolation {
    check: String,
    message: String,
    #[serde(default)]
    resource: String,
    severity: String,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    line_start: Option<usize>,
    #[serde(default)]
    line_end: Option<usize>,
}

pub fn parse_zodiac_report(raw: &str) -> Result<Vec<RawFinding>, serde_yaml::Error> {
    let report: ZodiacReport = serde_yaml::from_str(raw)?;

    Ok(report
        .violations
        .into_iter()
        .map(|violation| {
            let mut finding =
                RawFinding::new(violation.check, violation.message, violation.severity)
                    .with_resource(violation.resource);

            if let Some(detail) = violation.detail {
                finding = finding.with_description(detail);
            }
            if let Some(suggestion) = violation.suggestion {
                finding = finding.with_remediation(suggestion);
            }
            if let Some(file) = violation.file {
                let mut location = Location::new(file);
                if let (Some(start), Some(end)) = (violation.line_start, violation.line_end) {
                    location = location.with_lines(start, end);
                }
                finding = finding.with_location(location);
            }
            finding
        })
        .collect())
}

fn scratch_report_file() -> Result<NamedTempFile, PluginError> {
    tempfile::Builder::new()
        .prefix("zodiac-")
        .suffix(".yaml")
        .tempfile()
        .map_err(|e| PluginError::ExecutionError(format!("failed to create scratch file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_violations_with_locations() {
        let raw = r#"
violations:
  - check: ZDC-004
    message: TLS disabled on load balancer listener
    resource: aws_lb_listener.front
    severity: violation
    detail: Listener accepts plaintext HTTP on port 80
    suggestion: Terminate TLS with an ACM certificate
    file: lb.tf
    line_start: 12
    line_end: 20
  - check: ZDC-010
    message: Unreferenced variable
    severity: notice
"#;

        let findings = parse_zodiac_report(raw).unwrap();
        assert_eq!(findings.len(), 2);

        assert_eq!(findings[0].rule_id, "ZDC-004");
        assert_eq!(findings[0].native_severity, "violation");
        assert_eq!(findings[0].resource, "aws_lb_listener.front");
        assert_eq!(findings[0].location.as_ref().unwrap().line_start, Some(12));
        assert!(findings[0].remediation.is_some());

        assert!(findings[1].resource.is_empty());
        assert!(findings[1].location.is_none());
    }

    #[test]
    fn empty_report_is_not_an_error() {
        assert!(parse_zodiac_report("{}").unwrap().is_empty());
        assert!(parse_zodiac_report("violations: []").unwrap().is_empty());
    }

    #[test]
    fn scratch_report_files_are_unique_and_removed_on_drop() {
        let first = scratch_report_file().unwrap();
        let second = scratch_report_file().unwrap();
        assert_ne!(first.path(), second.path());

        let path = first.path().to_path_buf();
        assert!(path.exists());
        drop(first);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_installation_is_invalid_config() {
        let mut config = PluginConfig::new();
        config.insert(
            "zodiac_path".into(),
            serde_json::json!("/nonexistent/zodiac"),
        );

        let plugin = ZodiacPlugin::new(config);
        let err = plugin.validate_config().await.unwrap_err();
        assert!(matches!(err, PluginError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn unconfigured_path_is_invalid_config() {
        let plugin = ZodiacPlugin::new(PluginConfig::new());
        assert!(matches!(
            plugin.validate_config().await,
            Err(PluginError::InvalidConfig(_))
        ));
    }
}
