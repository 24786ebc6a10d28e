use async_trait::async_trait;
use mindloom_shared::{ChatMessage, ProviderConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Completion, CompletionProvider, CompletionRequest};
use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct PerplexityClient {
    client: Client,
    config: ProviderConfig,
}

#[derive(Debug, Serialize)]
struct PerplexityRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    return_images: bool,
    return_related_questions: bool,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct PerplexityResponse {
    #[serde(default)]
    choices: Vec<PerplexityChoice>,
    #[serde(default)]
    related_questions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PerplexityChoice {
    message: PerplexityMessage,
}

#[derive(Debug, Deserialize)]
struct PerplexityMessage {
    #[serde(default)]
    content: Option<String>,
}

impl PerplexityClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionProvider for PerplexityClient {
    fn name(&self) -> &'static str {
        "perplexity"
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::ConfigurationError("Perplexity API key not configured".to_string())
            })?;

        let body = PerplexityRequest {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.settings.temperature,
            top_p: request.settings.top_p,
            max_tokens: request.settings.max_output_tokens,
            return_images: false,
            return_related_questions: true,
            frequency_penalty: 1.0,
            presence_penalty: 0.0,
        };

        debug!(model = %self.config.model, messages = request.messages.len(), "Calling Perplexity");

        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.api_url.trim_end_matches('/')
            ))
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Perplexity API returned {}: {}", status, error_text);
            return Err(AppError::LlmError(format!(
                "Perplexity API error: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )));
        }

        let parsed: PerplexityResponse = response.json().await.map_err(|e| {
            AppError::LlmError(format!("Failed to parse Perplexity response: {}", e))
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::LlmError("Perplexity returned no choices".to_string()))?;

        Ok(Completion {
            text,
            related_questions: parsed.related_questions.unwrap_or_default(),
            provider: self.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerationSettings;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> PerplexityClient {
        PerplexityClient::new(
            ProviderConfig::perplexity()
                .with_api_key("pplx-test")
                .with_api_url(server.uri()),
        )
        .unwrap()
    }

    fn chat_request() -> CompletionRequest {
        CompletionRequest::chat(
            vec![ChatMessage::system("be brief"), ChatMessage::user("why?")],
            GenerationSettings {
                temperature: 0.2,
                top_p: 0.9,
                max_output_tokens: 1000,
                ..GenerationSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn test_complete_returns_answer_and_related_questions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer pplx-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.1-sonar-small-128k-online",
                "return_related_questions": true,
                "max_tokens": 1000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "because" } }],
                "related_questions": ["and then?"]
            })))
            .mount(&server)
            .await;

        let completion = client_for(&server).complete(&chat_request()).await.unwrap();
        assert_eq!(completion.text, "because");
        assert_eq!(completion.related_questions, vec!["and then?".to_string()]);
        assert_eq!(completion.provider, "perplexity");
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&chat_request()).await.unwrap_err();
        assert!(matches!(err, AppError::LlmError(_)));
    }

    #[tokio::test]
    async fn test_http_failure_is_llm_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).complete(&chat_request()).await.unwrap_err();
        assert_eq!(err.message(), "Perplexity API error: Unauthorized");
    }
}
