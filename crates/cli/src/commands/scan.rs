//! Scan command: orchestrate the registered backends and render the report.
//!
//! Backends run concurrently with independent time budgets, so the wall-clock
//! cost of a scan is roughly the slowest backend rather than the sum. A
//! backend failing, timing out, or missing its binary shows up as a status
//! line in the output instead of failing the whole scan; only request-level
//! mistakes (unknown tool name, bad path) abort with a non-zero exit.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use iacscan_engine::core::{OrchestratorConfig, OutcomeStatus, Report, ScanRequest, Severity};
use iacscan_engine::plugins::discover_plugins;
use iacscan_engine::runner::Orchestrator;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "llm")]
use iacscan_engine::llm::{OpenAIProvider, ReportEnricher};

#[derive(Args)]
pub struct ScanArgs {
    /// Directory or file to scan.
    #[arg(short, long)]
    pub path: PathBuf,

    /// Backend to run; repeat for several. Omit to run all registered.
    #[arg(short = 't', long = "tool")]
    pub tools: Vec<String>,

    /// Write the report to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Per-backend time budget in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Attach model-generated commentary to the report.
    #[cfg(feature = "llm")]
    #[arg(long)]
    pub llm: bool,

    /// Model to use for commentary.
    #[cfg(feature = "llm")]
    #[arg(long, requires = "llm")]
    pub model: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum OutputFormat {
    Console,
    Json,
    Yaml,
    Markdown,
}

pub async fn execute(args: ScanArgs) -> Result<()> {
    let registry = Arc::new(discover_plugins()?);

    let mut config = OrchestratorConfig::default();
    if let Some(secs) = args.timeout_secs {
        config.plugin_timeout = Duration::from_secs(secs);
    }

    #[allow(unused_mut)]
    let mut orchestrator = Orchestrator::new(registry).with_config(config);

    #[cfg(feature = "llm")]
    let enrich = args.llm;
    #[cfg(not(feature = "llm"))]
    let enrich = false;

    #[cfg(feature = "llm")]
    if args.llm {
        let provider = OpenAIProvider::new(args.model.clone())
            .context("LLM enrichment requested but the provider could not be configured")?;
        orchestrator = orchestrator.with_enricher(Arc::new(ReportEnricher::new(Arc::new(provider))));
    }

    let request = ScanRequest::new(&args.path)
        .with_plugins(args.tools.clone())
        .with_enrichment(enrich);

    let report = orchestrator.execute(request).await?;

    match &args.output {
        Some(path) => {
            let rendered = match args.format {
                OutputFormat::Console => {
                    anyhow::bail!("choose --format json, yaml, or markdown with --output")
                }
                OutputFormat::Json => report.to_json()?,
                OutputFormat::Yaml => report.to_yaml()?,
                OutputFormat::Markdown => report.to_markdown(),
            };
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            println!("📄 Report written to {}", path.display());
        }
        None => match args.format {
            OutputFormat::Console => print_console(&report),
            OutputFormat::Json => println!("{}", report.to_json()?),
            OutputFormat::Yaml => println!("{}", report.to_yaml()?),
            OutputFormat::Markdown => println!("{}", report.to_markdown()),
        },
    }

    Ok(())
}

fn print_console(report: &Report) {
    println!("{}", "🔍 IaC Scan Report".bright_blue().bold());
    println!("{}", "=".repeat(50).bright_blue());
    println!("📁 Target: {}", report.target);
    println!();

    for outcome in &report.outcomes {
        let line = match outcome.status {
            OutcomeStatus::Succeeded => format!(
                "✅ {} finished in {:.1}s",
                outcome.plugin,
                outcome.duration.as_secs_f64()
            )
            .green()
            .to_string(),
            OutcomeStatus::Failed => format!(
                "❌ {} failed: {}",
                outcome.plugin,
                outcome.error.as_deref().unwrap_or("unknown error")
            )
            .red()
            .to_string(),
            OutcomeStatus::TimedOut => format!(
                "⏱️  {} timed out after {:.0}s",
                outcome.plugin,
                outcome.duration.as_secs_f64()
            )
            .yellow()
            .to_string(),
            OutcomeStatus::Cancelled => {
                format!("🚫 {} cancelled", outcome.plugin).yellow().to_string()
            }
        };
        println!("{}", line);
    }
    println!();

    if report.findings.is_empty() {
        println!("{}", "✅ No findings".green().bold());
    } else {
        println!(
            "{}",
            format!("⚠️  {} findings:", report.findings.len()).bold()
        );
        for finding in &report.findings {
            println!(
                "\n{} {} [{}] {}",
                finding.severity.emoji(),
                finding.severity.to_string().bold(),
                finding.rule_id,
                finding.title
            );
            if !finding.resource.is_empty() {
                println!("   Resource: {}", finding.resource);
            }
            println!("   Detected by: {}", finding.provenance.join(", "));
            if let Some(remediation) = &finding.remediation {
                println!("   Remediation: {}", remediation);
            }
            if let Some(location) = &finding.location {
                match location.line_start {
                    Some(line) => println!("   Location: {}:{}", location.file, line),
                    None => println!("   Location: {}", location.file),
                }
            }
        }
    }

    println!();
    let counts: Vec<String> = Severity::all_descending()
        .iter()
        .map(|severity| {
            format!(
                "{} {}",
                report.summary.get(*severity),
                severity.to_string().to_lowercase()
            )
        })
        .collect();
    println!("📊 Summary: {}", counts.join(", "));

    if let Some(enrichment) = &report.enrichment {
        println!();
        println!("{}", "🤖 Analysis".bright_blue().bold());
        println!("{}", enrichment);
    }
}
