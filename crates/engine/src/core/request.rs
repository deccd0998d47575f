use crate::core::plugin::PluginConfig;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Input to one orchestration run. Constructed per call, immutable while the
/// run is in flight.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Target path; must exist and be readable.
    pub path: PathBuf,

    /// Plugins to run, in order. Empty means "all registered".
    pub plugins: Vec<String>,

    /// Per-plugin configuration overrides, keyed by plugin name.
    pub config_overrides: HashMap<String, PluginConfig>,

    /// Whether to run the enrichment hook over the finished report.
    pub enrich: bool,
}

impl ScanRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            plugins: Vec::new(),
            config_overrides: HashMap::new(),
            enrich: false,
        }
    }

    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_config_override(mut self, plugin: impl Into<String>, config: PluginConfig) -> Self {
        self.config_overrides.insert(plugin.into(), config);
        self
    }

    pub fn with_enrichment(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }
}

/// Tunable knobs for the orchestrator itself.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Wall-clock budget applied independently to every plugin invocation.
    pub plugin_timeout: Duration,

    /// How long the enrichment hook may run before the report ships without
    /// enrichment text.
    pub enrichment_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            plugin_timeout: Duration::from_secs(300),
            enrichment_timeout: Duration::from_secs(60),
        }
    }
}
