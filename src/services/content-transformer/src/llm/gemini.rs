use async_trait::async_trait;
use mindloom_shared::ProviderConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Completion, CompletionProvider, CompletionRequest};
use crate::error::{AppError, Result};

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: ProviderConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<GeminiSafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                AppError::InternalServerError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_body(request: &CompletionRequest) -> GeminiRequest {
        let settings = &request.settings;
        let safety_settings = if settings.block_harmful_content {
            vec![
                GeminiSafetySetting {
                    category: "HARM_CATEGORY_HARASSMENT",
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                },
                GeminiSafetySetting {
                    category: "HARM_CATEGORY_HATE_SPEECH",
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                },
            ]
        } else {
            Vec::new()
        };

        GeminiRequest {
            contents: vec![GeminiContent {
                parts: request
                    .messages
                    .iter()
                    .map(|msg| GeminiPart {
                        text: Some(msg.content.clone()),
                    })
                    .collect(),
            }],
            generation_config: GeminiGenerationConfig {
                temperature: settings.temperature,
                top_k: settings.top_k,
                top_p: settings.top_p,
                max_output_tokens: settings.max_output_tokens,
            },
            safety_settings,
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
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
            .ok_or_else(|| AppError::ConfigurationError("Gemini API key not configured".to_string()))?;

        debug!(model = %self.config.model, parts = request.messages.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&Self::build_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, error_text);
            return Err(AppError::LlmError(format!(
                "Gemini API error: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            AppError::LlmError(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| request.settings.empty_placeholder.to_string());

        Ok(Completion {
            text,
            related_questions: Vec::new(),
            provider: self.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerationSettings, NO_CONTENT_GENERATED};
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            ProviderConfig::gemini()
                .with_api_key("test-key")
                .with_api_url(server.uri()),
        )
        .unwrap()
    }

    #[test]
    fn test_body_includes_safety_settings_only_when_asked() {
        let request = CompletionRequest::prompt("hello", GenerationSettings::default());
        let body = serde_json::to_value(GeminiClient::build_body(&request)).unwrap();
        assert!(body.get("safetySettings").is_none());
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");

        let request = CompletionRequest::prompt("hello", GenerationSettings::default().with_safety());
        let body = serde_json::to_value(GeminiClient::build_body(&request)).unwrap();
        assert_eq!(body["safetySettings"][1]["category"], "HARM_CATEGORY_HATE_SPEECH");
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_MEDIUM_AND_ABOVE");
    }

    #[tokio::test]
    async fn test_complete_reads_first_candidate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": { "maxOutputTokens": 2048 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "generated" }] } }]
            })))
            .mount(&server)
            .await;

        let completion = client_for(&server)
            .complete(&CompletionRequest::prompt("prompt", GenerationSettings::default()))
            .await
            .unwrap();
        assert_eq!(completion.text, "generated");
        assert_eq!(completion.provider, "gemini");
    }

    #[tokio::test]
    async fn test_complete_defaults_when_no_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let completion = client_for(&server)
            .complete(&CompletionRequest::prompt("prompt", GenerationSettings::default()))
            .await
            .unwrap();
        assert_eq!(completion.text, NO_CONTENT_GENERATED);
    }

    #[tokio::test]
    async fn test_complete_maps_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(&CompletionRequest::prompt("prompt", GenerationSettings::default()))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Gemini API error: Service Unavailable");
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let client = GeminiClient::new(ProviderConfig::gemini()).unwrap();
        assert!(!client.is_configured());
        let err = client
            .complete(&CompletionRequest::prompt("prompt", GenerationSettings::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConfigurationError(_)));
    }
}
