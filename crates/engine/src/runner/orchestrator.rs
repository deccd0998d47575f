//! Concurrent execution of a plugin set with isolation and bounded latency.
//!
//! Request-level problems (unknown plugin name, missing path, nothing to run)
//! fail the whole call before any plugin starts. Everything that goes wrong
//! inside an individual plugin becomes data instead: a `PluginOutcome` in the
//! report, so one misbehaving scanner never denies the results of the others.

use crate::core::{
    merge_config, Aggregator, Enricher, OrchestratorConfig, Plugin, PluginDescriptor,
    PluginOutcome, Report, ScanRequest,
};
use crate::runner::PluginRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("path not found or unreadable: {0}")]
    InvalidPath(PathBuf),

    #[error("no plugins registered to run")]
    EmptyPluginSet,
}

/// Caller-facing handle for cancelling an in-flight request. Triggering it
/// short-circuits every unfinished plugin with a `Cancelled` outcome.
#[derive(Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

async fn wait_for_cancel(signal: Option<CancelSignal>) {
    match signal {
        Some(CancelSignal { mut rx }) => loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling; nothing will ever fire.
                std::future::pending::<()>().await;
            }
        },
        None => std::future::pending().await,
    }
}

pub struct Orchestrator {
    registry: Arc<PluginRegistry>,
    config: OrchestratorConfig,
    enricher: Option<Arc<dyn Enricher>>,
}

impl Orchestrator {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            config: OrchestratorConfig::default(),
            enricher: None,
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub async fn execute(&self, request: ScanRequest) -> Result<Report, RequestError> {
        self.execute_cancellable(request, None).await
    }

    pub async fn execute_cancellable(
        &self,
        request: ScanRequest,
        cancel: Option<CancelSignal>,
    ) -> Result<Report, RequestError> {
        if tokio::fs::metadata(&request.path).await.is_err() {
            return Err(RequestError::InvalidPath(request.path.clone()));
        }

        // Fail-fast resolution of the whole set before any plugin runs.
        let resolved = self.resolve(&request)?;
        info!(
            target = %request.path.display(),
            plugins = resolved.len(),
            "starting scan"
        );

        let outcomes = self.run_plugins(&request, &resolved, cancel).await;

        let descriptors: Vec<PluginDescriptor> =
            resolved.iter().map(|(d, _)| d.clone()).collect();
        let mut report = Aggregator::new(descriptors).aggregate(&request.path, outcomes);

        if request.enrich {
            report.enrichment = self.enrich(&report).await;
        }

        info!(
            findings = report.findings.len(),
            succeeded = report.succeeded_plugins(),
            requested = report.outcomes.len(),
            "scan complete"
        );
        Ok(report)
    }

    fn resolve(
        &self,
        request: &ScanRequest,
    ) -> Result<Vec<(PluginDescriptor, Arc<dyn Plugin>)>, RequestError> {
        let names: Vec<String> = if request.plugins.is_empty() {
            self.registry.list().map(|d| d.name.to_string()).collect()
        } else {
            let mut seen = Vec::new();
            for name in &request.plugins {
                if !seen.contains(name) {
                    seen.push(name.clone());
                }
            }
            seen
        };

        if names.is_empty() {
            return Err(RequestError::EmptyPluginSet);
        }

        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let factory = self
                .registry
                .get(&name)
                .ok_or_else(|| RequestError::UnknownPlugin(name.clone()))?;
            // descriptor exists whenever the factory does
            let descriptor = self
                .registry
                .descriptor(&name)
                .ok_or_else(|| RequestError::UnknownPlugin(name.clone()))?
                .clone();

            let config = merge_config(
                &descriptor.default_config,
                request.config_overrides.get(&name),
            );
            resolved.push((descriptor, factory(config)));
        }
        Ok(resolved)
    }

    async fn run_plugins(
        &self,
        request: &ScanRequest,
        resolved: &[(PluginDescriptor, Arc<dyn Plugin>)],
        cancel: Option<CancelSignal>,
    ) -> Vec<PluginOutcome> {
        let budget = self.config.plugin_timeout;
        let mut tasks: JoinSet<(usize, PluginOutcome)> = JoinSet::new();

        for (index, (descriptor, plugin)) in resolved.iter().enumerate() {
            let name = descriptor.name.to_string();
            let plugin = Arc::clone(plugin);
            let path = request.path.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let started = Instant::now();
                debug!(plugin = %name, "launching scan");

                let work = async {
                    plugin.validate_config().await?;
                    plugin.scan(&path).await
                };

                let outcome = tokio::select! {
                    _ = wait_for_cancel(cancel) => {
                        warn!(plugin = %name, "scan cancelled by caller");
                        PluginOutcome::cancelled(&name, started.elapsed())
                    }
                    result = tokio::time::timeout(budget, work) => match result {
                        Ok(Ok(findings)) => {
                            debug!(plugin = %name, findings = findings.len(), "scan succeeded");
                            PluginOutcome::succeeded(&name, findings, started.elapsed())
                        }
                        Ok(Err(error)) => {
                            warn!(plugin = %name, %error, "scan failed");
                            PluginOutcome::failed(&name, error.to_string(), started.elapsed())
                        }
                        Err(_) => {
                            warn!(plugin = %name, budget_secs = budget.as_secs(), "scan timed out");
                            PluginOutcome::timed_out(&name, budget)
                        }
                    },
                };

                (index, outcome)
            });
        }

        // Completion barrier: every plugin reaches a terminal state before
        // aggregation starts.
        let mut outcomes: Vec<Option<PluginOutcome>> = vec![None; resolved.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(join_error) => {
                    // A panicking plugin is isolated like any other failure;
                    // its slot is filled below.
                    warn!(%join_error, "plugin task aborted");
                }
            }
        }

        outcomes
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| {
                outcome.unwrap_or_else(|| {
                    PluginOutcome::failed(
                        resolved[index].0.name,
                        "plugin task panicked",
                        Duration::ZERO,
                    )
                })
            })
            .collect()
    }

    async fn enrich(&self, report: &Report) -> Option<String> {
        let enricher = match &self.enricher {
            Some(enricher) => enricher,
            None => {
                debug!("enrichment requested but no enricher configured");
                return None;
            }
        };

        match tokio::time::timeout(self.config.enrichment_timeout, enricher.enrich(report)).await
        {
            Ok(Ok(text)) => Some(text),
            Ok(Err(error)) => {
                warn!(enricher = enricher.name(), %error, "enrichment failed; continuing without it");
                None
            }
            Err(_) => {
                warn!(
                    enricher = enricher.name(),
                    timeout_secs = self.config.enrichment_timeout.as_secs(),
                    "enrichment timed out; continuing without it"
                );
                None
            }
        }
    }
}
