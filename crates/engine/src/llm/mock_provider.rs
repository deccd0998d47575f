use crate::llm::provider::{LLMError, LLMProvider, LLMRequest, LLMResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory provider for tests. Records calls and either returns a canned
/// response or fails, optionally after an artificial delay.
pub struct MockLLMProvider {
    response: String,
    delay: Option<Duration>,
    call_count: AtomicUsize,
    should_fail: bool,
}

impl Default for MockLLMProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLLMProvider {
    pub fn new() -> Self {
        Self::with_response("mock analysis: no significant risks identified")
    }

    pub fn with_response(response: &str) -> Self {
        Self {
            response: response.to_string(),
            delay: None,
            call_count: AtomicUsize::new(0),
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        let mut provider = Self::new();
        provider.should_fail = true;
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    async fn analyze(&self, _request: LLMRequest) -> Result<LLMResponse, LLMError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.should_fail {
            return Err(LLMError::ApiError("mock provider failure".to_string()));
        }

        Ok(LLMResponse {
            content: self.response.clone(),
            model: "mock".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> LLMRequest {
        LLMRequest {
            system_prompt: "system".to_string(),
            user_prompt: "user".to_string(),
            temperature: 0.2,
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn counts_calls() {
        let provider = MockLLMProvider::new();
        provider.analyze(request()).await.unwrap();
        provider.analyze(request()).await.unwrap();
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn failing_provider_errors() {
        let provider = MockLLMProvider::failing();
        let result = provider.analyze(request()).await;
        assert!(matches!(result, Err(LLMError::ApiError(_))));
        assert_eq!(provider.call_count(), 1);
    }
}
