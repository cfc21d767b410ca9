use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::{config::OpenAiConfig, error::SummarizationError, provider::Model};

/// One chat completion: a system instruction plus a single user message.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: Model,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait SummarizationBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, SummarizationError>;
}

/// OpenAI chat completions over HTTP.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiBackend {
    pub fn new(config: &OpenAiConfig) -> Result<Self, SummarizationError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| SummarizationError::MissingApiKey {
                env_var: "OPENAI_API_KEY".to_string(),
            })?;
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }
}

/// Build the chat completions body. Reasoning models take
/// `max_completion_tokens` and only accept the default temperature.
pub fn request_body(request: &CompletionRequest) -> Value {
    let mut body = json!({
        "model": request.model.id(),
        "messages": [
            {
                "role": "system",
                "content": request.system,
            },
            {
                "role": "user",
                "content": request.user,
            },
        ],
    });

    if request.model.config().reasoning {
        body["max_completion_tokens"] = json!(request.max_tokens);
    } else {
        body["max_tokens"] = json!(request.max_tokens);
        body["temperature"] = json!(request.temperature);
    }
    body
}

#[async_trait]
impl SummarizationBackend for OpenAiBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, SummarizationError> {
        debug!(model = %request.model, prompt_chars = request.user.len(), "requesting completion");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body(request))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let response: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = response["error"]["message"]
                .as_str()
                .unwrap_or(text.as_str());
            if status.as_u16() == 404 && response["error"]["code"] == "model_not_found" {
                return Err(SummarizationError::ModelUnavailable {
                    model: request.model.id().to_string(),
                });
            }
            return Err(SummarizationError::Upstream {
                reason: format!("HTTP {}: {}", status.as_u16(), message),
            });
        }

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| SummarizationError::MalformedResponse {
                reason: format!("Invalid API response: {}", response),
            })?;

        Ok(content.to_string())
    }
}
