//! Core abstractions of the scanning engine: the plugin contract, the
//! canonical data model, and the normalization/correlation machinery that
//! turns heterogeneous backend outputs into one stable report.

pub mod correlation;
pub mod enrichment;
pub mod finding;
pub mod outcome;
pub mod plugin;
pub mod report;
pub mod request;
pub mod severity;

pub use correlation::{rule_category, Aggregator, CorrelationKey};
pub use enrichment::Enricher;
pub use finding::{Finding, Location, RawFinding};
pub use outcome::{OutcomeStatus, PluginOutcome};
pub use plugin::{
    merge_config, Plugin, PluginCapabilities, PluginConfig, PluginDescriptor, PluginError,
};
pub use report::{Report, SeveritySummary};
pub use request::{OrchestratorConfig, ScanRequest};
pub use severity::Severity;
