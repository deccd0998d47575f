use crate::core::{Enricher, Report};
use crate::llm::prompts::{build_enrichment_prompt, SYSTEM_PROMPT};
use crate::llm::provider::{LLMProvider, LLMRequest};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Enricher backed by an [`LLMProvider`]. Turns the finished report into a
/// prompt and returns the model's commentary verbatim.
pub struct ReportEnricher {
    provider: Arc<dyn LLMProvider>,
}

impl ReportEnricher {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Enricher for ReportEnricher {
    async fn enrich(&self, report: &Report) -> Result<String> {
        let user_prompt = build_enrichment_prompt(report);
        debug!(
            model = %self.provider.model_name(),
            prompt_tokens = self.provider.estimate_tokens(&user_prompt),
            "requesting report commentary"
        );

        let response = self
            .provider
            .analyze(LLMRequest {
                system_prompt: SYSTEM_PROMPT.to_string(),
                user_prompt,
                temperature: 0.2,
                max_tokens: 4000,
            })
            .await?;

        Ok(response.content)
    }

    fn name(&self) -> &str {
        "llm-report-enricher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock_provider::MockLLMProvider;

    fn empty_report() -> Report {
        Report::new("/tmp/project".to_string(), Vec::new(), Vec::new())
    }

    #[tokio::test]
    async fn returns_provider_content() {
        let provider = Arc::new(MockLLMProvider::with_response("looks fine overall"));
        let enricher = ReportEnricher::new(provider.clone());

        let commentary = enricher.enrich(&empty_report()).await.unwrap();
        assert_eq!(commentary, "looks fine overall");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn propagates_provider_failure() {
        let provider = Arc::new(MockLLMProvider::failing());
        let enricher = ReportEnricher::new(provider);

        assert!(enricher.enrich(&empty_report()).await.is_err());
    }
}
