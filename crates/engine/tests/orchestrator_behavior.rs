use async_trait::async_trait;
use iacscan_engine::core::{
    Enricher, OrchestratorConfig, OutcomeStatus, Plugin, PluginCapabilities, PluginConfig,
    PluginDescriptor, PluginError, RawFinding, Report, ScanRequest, Severity,
};
use iacscan_engine::runner::{cancel_pair, Orchestrator, PluginRegistryBuilder, RequestError};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const STUB_SEVERITIES: &[(&str, Severity)] = &[
    ("critical", Severity::Critical),
    ("high", Severity::High),
    ("medium", Severity::Medium),
    ("low", Severity::Low),
    ("info", Severity::Info),
];

#[derive(Clone)]
enum Behavior {
    Findings(Vec<RawFinding>),
    Fail(String),
    Sleep(Duration),
}

struct StubPlugin {
    name: &'static str,
    behavior: Behavior,
    invocations: Arc<AtomicUsize>,
}

#[async_trait]
impl Plugin for StubPlugin {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn scan(&self, _path: &Path) -> Result<Vec<RawFinding>, PluginError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Findings(findings) => Ok(findings.clone()),
            Behavior::Fail(message) => Err(PluginError::ExecutionError(message.clone())),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(Vec::new())
            }
        }
    }
}

fn stub_descriptor(name: &'static str) -> PluginDescriptor {
    PluginDescriptor {
        name,
        description: "stub backend",
        default_config: PluginConfig::new(),
        capabilities: PluginCapabilities::default(),
        severity_map: STUB_SEVERITIES,
    }
}

fn stub(
    builder: PluginRegistryBuilder,
    name: &'static str,
    behavior: Behavior,
) -> (PluginRegistryBuilder, Arc<AtomicUsize>) {
    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&invocations);
    let builder = builder
        .with_plugin(
            stub_descriptor(name),
            Arc::new(move |_config| {
                Arc::new(StubPlugin {
                    name,
                    behavior: behavior.clone(),
                    invocations: Arc::clone(&counter),
                }) as Arc<dyn Plugin>
            }),
        )
        .unwrap();
    (builder, invocations)
}

fn finding(rule: &str, severity: &str, resource: &str) -> RawFinding {
    RawFinding::new(rule, format!("issue {rule}"), severity).with_resource(resource)
}

#[tokio::test]
async fn unknown_plugin_fails_before_any_plugin_runs() {
    let dir = tempfile::tempdir().unwrap();
    let (builder, invocations) = stub(
        PluginRegistryBuilder::new(),
        "alpha",
        Behavior::Findings(vec![finding("R1", "high", "res")]),
    );
    let orchestrator = Orchestrator::new(Arc::new(builder.build()));

    let request = ScanRequest::new(dir.path()).with_plugins(["alpha", "nope"]);
    let error = orchestrator.execute(request).await.unwrap_err();

    assert!(matches!(error, RequestError::UnknownPlugin(name) if name == "nope"));
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_path_is_rejected() {
    let (builder, _) = stub(
        PluginRegistryBuilder::new(),
        "alpha",
        Behavior::Findings(Vec::new()),
    );
    let orchestrator = Orchestrator::new(Arc::new(builder.build()));

    let request = ScanRequest::new("/definitely/not/a/real/path");
    let error = orchestrator.execute(request).await.unwrap_err();
    assert!(matches!(error, RequestError::InvalidPath(_)));
}

#[tokio::test]
async fn empty_plugin_list_runs_everything_registered() {
    let dir = tempfile::tempdir().unwrap();
    let (builder, alpha_calls) = stub(
        PluginRegistryBuilder::new(),
        "alpha",
        Behavior::Findings(vec![finding("R1", "high", "a")]),
    );
    let (builder, beta_calls) = stub(
        builder,
        "beta",
        Behavior::Findings(vec![finding("R2", "low", "b")]),
    );
    let orchestrator = Orchestrator::new(Arc::new(builder.build()));

    let report = orchestrator
        .execute(ScanRequest::new(dir.path()))
        .await
        .unwrap();

    assert_eq!(alpha_calls.load(Ordering::SeqCst), 1);
    assert_eq!(beta_calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.findings.len(), 2);
    // Outcomes follow registration order when the request names nothing.
    assert_eq!(report.outcomes[0].plugin, "alpha");
    assert_eq!(report.outcomes[1].plugin, "beta");
}

#[tokio::test]
async fn one_failing_plugin_does_not_block_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let (builder, _) = stub(
        PluginRegistryBuilder::new(),
        "alpha",
        Behavior::Findings(vec![finding("R1", "critical", "vm-1")]),
    );
    let (builder, _) = stub(
        builder,
        "beta",
        Behavior::Fail("scanner binary exploded".to_string()),
    );
    let orchestrator = Orchestrator::new(Arc::new(builder.build()));

    let report = orchestrator
        .execute(ScanRequest::new(dir.path()))
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].status, OutcomeStatus::Succeeded);
    assert_eq!(report.outcomes[1].status, OutcomeStatus::Failed);
    assert!(report.outcomes[1]
        .error
        .as_deref()
        .unwrap()
        .contains("scanner binary exploded"));
    // The healthy plugin's findings still make it into the report.
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].rule_id, "R1");
}

#[tokio::test]
async fn slow_plugin_is_timed_out_within_its_budget() {
    let dir = tempfile::tempdir().unwrap();
    let (builder, _) = stub(
        PluginRegistryBuilder::new(),
        "slow",
        Behavior::Sleep(Duration::from_secs(60)),
    );
    let (builder, _) = stub(
        builder,
        "fast",
        Behavior::Findings(vec![finding("R9", "medium", "db")]),
    );
    let orchestrator = Orchestrator::new(Arc::new(builder.build())).with_config(
        OrchestratorConfig {
            plugin_timeout: Duration::from_millis(50),
            ..OrchestratorConfig::default()
        },
    );

    let report = orchestrator
        .execute(ScanRequest::new(dir.path()))
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].status, OutcomeStatus::TimedOut);
    assert_eq!(report.outcomes[1].status, OutcomeStatus::Succeeded);
    assert_eq!(report.findings.len(), 1);
}

#[tokio::test]
async fn all_plugins_timing_out_still_yields_a_report() {
    let dir = tempfile::tempdir().unwrap();
    let (builder, _) = stub(
        PluginRegistryBuilder::new(),
        "slow-a",
        Behavior::Sleep(Duration::from_secs(60)),
    );
    let (builder, _) = stub(builder, "slow-b", Behavior::Sleep(Duration::from_secs(60)));
    let orchestrator = Orchestrator::new(Arc::new(builder.build())).with_config(
        OrchestratorConfig {
            plugin_timeout: Duration::from_millis(50),
            ..OrchestratorConfig::default()
        },
    );

    let report = orchestrator
        .execute(ScanRequest::new(dir.path()))
        .await
        .unwrap();

    assert!(report
        .outcomes
        .iter()
        .all(|o| o.status == OutcomeStatus::TimedOut));
    assert!(report.findings.is_empty());
    assert_eq!(report.summary.total(), 0);
}

#[tokio::test]
async fn cancellation_short_circuits_running_plugins() {
    let dir = tempfile::tempdir().unwrap();
    let (builder, _) = stub(
        PluginRegistryBuilder::new(),
        "slow",
        Behavior::Sleep(Duration::from_secs(60)),
    );
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(builder.build())));

    let (handle, signal) = cancel_pair();
    let request = ScanRequest::new(dir.path());
    let run = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.execute_cancellable(request, Some(signal)).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.cancel();

    let report = run.await.unwrap().unwrap();
    assert_eq!(report.outcomes[0].status, OutcomeStatus::Cancelled);
    assert!(report.findings.is_empty());
}

#[tokio::test]
async fn duplicate_plugin_names_in_request_run_once() {
    let dir = tempfile::tempdir().unwrap();
    let (builder, invocations) = stub(
        PluginRegistryBuilder::new(),
        "alpha",
        Behavior::Findings(vec![finding("R1", "low", "res")]),
    );
    let orchestrator = Orchestrator::new(Arc::new(builder.build()));

    let report = orchestrator
        .execute(ScanRequest::new(dir.path()).with_plugins(["alpha", "alpha", "alpha"]))
        .await
        .unwrap();

    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(report.outcomes.len(), 1);
}

struct FixedEnricher {
    text: Option<String>,
    delay: Option<Duration>,
}

#[async_trait]
impl Enricher for FixedEnricher {
    async fn enrich(&self, _report: &Report) -> anyhow::Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => anyhow::bail!("enricher backend unavailable"),
        }
    }
}

#[tokio::test]
async fn enrichment_success_attaches_commentary() {
    let dir = tempfile::tempdir().unwrap();
    let (builder, _) = stub(
        PluginRegistryBuilder::new(),
        "alpha",
        Behavior::Findings(vec![finding("R1", "high", "res")]),
    );
    let orchestrator = Orchestrator::new(Arc::new(builder.build())).with_enricher(Arc::new(
        FixedEnricher {
            text: Some("prioritize R1".to_string()),
            delay: None,
        },
    ));

    let report = orchestrator
        .execute(ScanRequest::new(dir.path()).with_enrichment(true))
        .await
        .unwrap();

    assert_eq!(report.enrichment.as_deref(), Some("prioritize R1"));
    assert_eq!(report.findings.len(), 1);
}

#[tokio::test]
async fn enrichment_failure_never_drops_findings() {
    let dir = tempfile::tempdir().unwrap();
    let (builder, _) = stub(
        PluginRegistryBuilder::new(),
        "alpha",
        Behavior::Findings(vec![finding("R1", "high", "res")]),
    );
    let orchestrator = Orchestrator::new(Arc::new(builder.build()))
        .with_enricher(Arc::new(FixedEnricher { text: None, delay: None }));

    let report = orchestrator
        .execute(ScanRequest::new(dir.path()).with_enrichment(true))
        .await
        .unwrap();

    assert!(report.enrichment.is_none());
    assert_eq!(report.findings.len(), 1);
}

#[tokio::test]
async fn enrichment_timeout_ships_the_report_without_it() {
    let dir = tempfile::tempdir().unwrap();
    let (builder, _) = stub(
        PluginRegistryBuilder::new(),
        "alpha",
        Behavior::Findings(vec![finding("R1", "high", "res")]),
    );
    let orchestrator = Orchestrator::new(Arc::new(builder.build()))
        .with_config(OrchestratorConfig {
            enrichment_timeout: Duration::from_millis(50),
            ..OrchestratorConfig::default()
        })
        .with_enricher(Arc::new(FixedEnricher {
            text: Some("too late".to_string()),
            delay: Some(Duration::from_secs(60)),
        }));

    let report = orchestrator
        .execute(ScanRequest::new(dir.path()).with_enrichment(true))
        .await
        .unwrap();

    assert!(report.enrichment.is_none());
    assert_eq!(report.findings.len(), 1);
}
