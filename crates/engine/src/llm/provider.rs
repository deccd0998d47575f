use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded,

    #[error("network error: {0}")]
    NetworkError(String),
}

#[derive(Debug, Clone)]
pub struct LLMRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub model: String,
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn analyze(&self, request: LLMRequest) -> Result<LLMResponse, LLMError>;

    fn model_name(&self) -> &str;

    fn estimate_tokens(&self, text: &str) -> usize {
        text.len() / 4
    }
}

pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
    model: String,
    default_temperature: f32,
    default_max_tokens: u32,
    max_retries: u32,
}

impl OpenAIProvider {
    pub fn new(model: Option<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;
        Ok(Self::with_config(
            api_key,
            model.unwrap_or_else(|| "gpt-4o".to_string()),
            0.2,
            4000,
        ))
    }

    pub fn with_config(api_key: String, model: String, temperature: f32, max_tokens: u32) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model,
            default_temperature: temperature,
            default_max_tokens: max_tokens,
            max_retries: 3,
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn analyze(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        let temperature = if request.temperature > 0.0 {
            request.temperature
        } else {
            self.default_temperature
        };
        let max_tokens = if request.max_tokens > 0 {
            request.max_tokens
        } else {
            self.default_max_tokens
        };

        debug!(model = %self.model, temperature, max_tokens, "sending enrichment request");

        let system_message = ChatCompletionRequestSystemMessage {
            content: request.system_prompt.clone(),
            ..Default::default()
        };
        let user_message = ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(request.user_prompt.clone()),
            ..Default::default()
        };

        let api_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_message),
                ChatCompletionRequestMessage::User(user_message),
            ])
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()
            .map_err(|e| LLMError::ApiError(e.to_string()))?;

        let mut attempt = 0;
        let response = loop {
            attempt += 1;

            match self.client.chat().create(api_request.clone()).await {
                Ok(response) => break response,
                Err(e) => {
                    let detail = e.to_string();
                    warn!(attempt, error = %detail, "OpenAI API error");

                    if attempt >= self.max_retries {
                        return Err(if detail.contains("rate") {
                            LLMError::RateLimitExceeded
                        } else {
                            LLMError::ApiError(detail)
                        });
                    }

                    let wait = if detail.contains("rate") {
                        Duration::from_secs(2_u64.pow(attempt))
                    } else {
                        Duration::from_millis(100 * attempt as u64)
                    };
                    tokio::time::sleep(wait).await;
                }
            }
        };

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| LLMError::InvalidResponse("no content in response".to_string()))?;

        Ok(LLMResponse {
            content,
            model: response.model,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
