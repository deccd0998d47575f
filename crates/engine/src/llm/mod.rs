pub mod enricher;
pub mod mock_provider;
pub mod prompts;
pub mod provider;

pub use enricher::ReportEnricher;
pub use mock_provider::MockLLMProvider;
pub use provider::{LLMError, LLMProvider, LLMRequest, LLMResponse, OpenAIProvider};
