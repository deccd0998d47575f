use crate::core::Report;
use anyhow::Result;
use async_trait::async_trait;

/// Optional post-processing hook fed the finished report.
///
/// Absence or failure of an enricher never affects the report's findings or
/// summary: the orchestrator bounds the call with a timeout, logs any error,
/// and ships the report without enrichment text.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, report: &Report) -> Result<String>;

    fn name(&self) -> &str {
        "enricher"
    }
}
