//! Plugin contract every scanner backend must satisfy.
//!
//! Backends are black boxes behind this trait: the engine hands them a path
//! and an opaque configuration map and gets raw findings back. A backend must
//! be safe to run concurrently with other plugin instances (no shared mutable
//! global state); individual instances need not be reentrant because the
//! orchestrator creates one instance per invocation.

use crate::core::{RawFinding, Severity};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// Opaque configuration mapping. The engine never inspects plugin-specific
/// keys; each plugin validates its own.
pub type PluginConfig = Map<String, Value>;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("required tool not found: {0}")]
    NotFound(String),

    #[error("scan timed out after {0} seconds")]
    Timeout(u64),

    #[error("execution error: {0}")]
    ExecutionError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    fn capabilities(&self) -> PluginCapabilities {
        PluginCapabilities::default()
    }

    /// Cheap preflight over the merged configuration, run inside the
    /// plugin's own time budget before `scan`.
    async fn validate_config(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Scan a readable directory or file. Unsupported content is the
    /// plugin's call: reject with `InvalidConfig` or return no findings.
    async fn scan(&self, path: &Path) -> Result<Vec<RawFinding>, PluginError>;
}

/// What a backend can do, surfaced through `plugins` listings.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PluginCapabilities {
    pub supports: Vec<String>,
    pub features: Vec<String>,
}

/// Identity of a registered plugin. Immutable once registered; lives for the
/// process lifetime.
#[derive(Clone)]
pub struct PluginDescriptor {
    pub name: &'static str,

    pub description: &'static str,

    pub default_config: PluginConfig,

    pub capabilities: PluginCapabilities,

    /// Fixed translation table from the plugin's native severity vocabulary
    /// to the canonical scale. Native severities missing from the table
    /// default to `Medium` during aggregation, with a note recorded on the
    /// finding.
    pub severity_map: &'static [(&'static str, Severity)],
}

impl PluginDescriptor {
    pub fn map_severity(&self, native: &str) -> Option<Severity> {
        self.severity_map
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(native))
            .map(|(_, severity)| *severity)
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Shallow key-wise merge: request overrides win over plugin defaults.
pub fn merge_config(defaults: &PluginConfig, overrides: Option<&PluginConfig>) -> PluginConfig {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overrides_take_precedence_over_defaults() {
        let mut defaults = PluginConfig::new();
        defaults.insert("frameworks".into(), json!(["all"]));
        defaults.insert("use_cli".into(), json!(true));

        let mut overrides = PluginConfig::new();
        overrides.insert("frameworks".into(), json!(["terraform"]));

        let merged = merge_config(&defaults, Some(&overrides));
        assert_eq!(merged["frameworks"], json!(["terraform"]));
        assert_eq!(merged["use_cli"], json!(true));
    }

    #[test]
    fn severity_lookup_is_case_insensitive() {
        let descriptor = PluginDescriptor {
            name: "t",
            description: "t",
            default_config: PluginConfig::new(),
            capabilities: PluginCapabilities::default(),
            severity_map: &[("HIGH", Severity::High)],
        };
        assert_eq!(descriptor.map_severity("high"), Some(Severity::High));
        assert_eq!(descriptor.map_severity("weird"), None);
    }
}
