//! Checkov backend: drives the Checkov CLI and adapts its JSON report.
//!
//! Configuration keys:
//! - `frameworks`: frameworks to scan (default `["all"]`)
//! - `checks`: specific check ids to run
//! - `skip_checks`: check ids to skip
//!
//! Severity table: Checkov's `CRITICAL`/`HIGH`/`MEDIUM`/`LOW`/`INFO` map
//! one-to-one onto the canonical scale. Checks without a platform severity
//! report `unknown` and fall through to the aggregator's Medium default.

use crate::core::{
    Location, Plugin, PluginCapabilities, PluginConfig, PluginDescriptor, PluginError, RawFinding,
    Severity,
};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub const CHECKOV_SEVERITIES: &[(&str, Severity)] = &[
    ("critical", Severity::Critical),
    ("high", Severity::High),
    ("medium", Severity::Medium),
    ("low", Severity::Low),
    ("info", Severity::Info),
];

pub struct CheckovPlugin {
    frameworks: Vec<String>,
    checks: Vec<String>,
    skip_checks: Vec<String>,
}

impl CheckovPlugin {
    pub fn new(config: PluginConfig) -> Self {
        Self {
            frameworks: string_list(&config, "frameworks", &["all"]),
            checks: string_list(&config, "checks", &[]),
            skip_checks: string_list(&config, "skip_checks", &[]),
        }
    }

    pub fn descriptor() -> PluginDescriptor {
        let mut default_config = PluginConfig::new();
        default_config.insert("frameworks".into(), serde_json::json!(["all"]));

        PluginDescriptor {
            name: "checkov",
            description: "Static code analysis tool for infrastructure-as-code",
            default_config,
            capabilities: PluginCapabilities {
                supports: [
                    "terraform",
                    "cloudformation",
                    "kubernetes",
                    "docker",
                    "arm",
                    "bicep",
                    "helm",
                    "serverless",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                features: ["security_checks", "compliance_checks", "misconfigurations"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            severity_map: CHECKOV_SEVERITIES,
        }
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new("checkov");
        if path.is_dir() {
            cmd.arg("-d").arg(path);
        } else {
            cmd.arg("-f").arg(path);
        }

        if !self.frameworks.iter().any(|f| f == "all") {
            for framework in &self.frameworks {
                cmd.arg("--framework").arg(framework);
            }
        }
        for check in &self.checks {
            cmd.arg("--check").arg(check);
        }
        for check in &self.skip_checks {
            cmd.arg("--skip-check").arg(check);
        }

        cmd.arg("--output").arg("json").arg("--quiet");
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl Plugin for CheckovPlugin {
    fn name(&self) -> &'static str {
        "checkov"
    }

    fn description(&self) -> &'static str {
        "Static code analysis tool for infrastructure-as-code"
    }

    fn capabilities(&self) -> PluginCapabilities {
        Self::descriptor().capabilities
    }

    async fn validate_config(&self) -> Result<(), PluginError> {
        let probe = Command::new("checkov")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match probe {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(PluginError::InvalidConfig(format!(
                "checkov --version exited with {}",
                status
            ))),
            Err(_) => Err(PluginError::NotFound("checkov".to_string())),
        }
    }

    async fn scan(&self, path: &Path) -> Result<Vec<RawFinding>, PluginError> {
        let output = self
            .command(path)
            .output()
            .await
            .map_err(|e| PluginError::ExecutionError(format!("failed to run checkov: {}", e)))?;

        // Checkov exits non-zero when checks fail; only an empty report is an
        // execution problem.
        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(PluginError::ExecutionError(format!(
                "checkov produced no output: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let parsed: Value = serde_json::from_str(stdout.trim())
            .map_err(|e| PluginError::ExecutionError(format!("unparseable checkov JSON: {}", e)))?;

        let findings = parse_checkov_report(&parsed);
        debug!(findings = findings.len(), "checkov scan parsed");
        Ok(findings)
    }
}

/// Checkov emits one report object per framework, or an array of them when
/// several frameworks matched. Only `failed_checks` become findings.
pub fn parse_checkov_report(value: &Value) -> Vec<RawFinding> {
    match value {
        Value::Array(reports) => reports.iter().flat_map(parse_single_report).collect(),
        _ => parse_single_report(value),
    }
}

fn parse_single_report(report: &Value) -> Vec<RawFinding> {
    let failed = report
        .pointer("/results/failed_checks")
        .and_then(Value::as_array);

    let Some(failed) = failed else {
        return Vec::new();
    };

    failed.iter().filter_map(parse_failed_check).collect()
}

fn parse_failed_check(check: &Value) -> Option<RawFinding> {
    let rule_id = check.get("check_id")?.as_str()?.to_string();
    let title = check
        .get("check_name")
        .and_then(Value::as_str)
        .unwrap_or(&rule_id)
        .to_string();

    let native_severity = check
        .get("severity")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let mut finding = RawFinding::new(rule_id, title, native_severity);

    if let Some(resource) = check.get("resource").and_then(Value::as_str) {
        finding = finding.with_resource(resource);
    }
    if let Some(guideline) = check.get("guideline").and_then(Value::as_str) {
        finding = finding.with_remediation(guideline);
    }
    if let Some(file) = check.get("file_path").and_then(Value::as_str) {
        let mut location = Location::new(file);
        if let Some(range) = check.get("file_line_range").and_then(Value::as_array) {
            if let (Some(start), Some(end)) = (
                range.first().and_then(Value::as_u64),
                range.get(1).and_then(Value::as_u64),
            ) {
                location = location.with_lines(start as usize, end as usize);
            }
        }
        finding = finding.with_location(location);
    }

    Some(finding)
}

fn string_list(config: &PluginConfig, key: &str, default: &[&str]) -> Vec<String> {
    config
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
}
