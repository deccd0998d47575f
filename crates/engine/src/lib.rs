//! IaC Scan Engine - Plugin Orchestration and Results Aggregation
//!
//! This crate provides a trait-based system for running infrastructure-as-code
//! security scanners concurrently and merging their results into one
//! normalized, deduplicated report.

pub mod core;
pub mod plugins;
pub mod runner;

#[cfg(feature = "llm")]
pub mod llm;

pub use core::{
    Aggregator, Enricher, Finding, Location, OrchestratorConfig, OutcomeStatus, Plugin,
    PluginCapabilities, PluginConfig, PluginDescriptor, PluginError, PluginOutcome, RawFinding,
    Report, ScanRequest, Severity, SeveritySummary,
};

pub use plugins::{discover_plugins, CheckovPlugin, ZodiacPlugin};

pub use runner::{
    cancel_pair, CancelHandle, CancelSignal, Orchestrator, PluginRegistry, PluginRegistryBuilder,
    RegistryError, RequestError,
};
