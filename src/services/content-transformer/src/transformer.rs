//! Content transformation: prompt, one completion, result

use mindloom_shared::{
    TransformContentRequest, TransformContentResponse, TransformationRequest,
    TransformationResult,
};
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, Result};
use crate::llm::{CompletionProvider, CompletionRequest};
use crate::prompts::{build_prompt, build_prompt_for_tag, generation_settings};

pub struct ContentTransformer {
    provider: Arc<dyn CompletionProvider>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl ContentTransformer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Typed transformation producing a record ready for history
    pub async fn transform(&self, request: &TransformationRequest) -> Result<TransformationResult> {
        let tag = request.transformation_type.as_str();
        let prompt = build_prompt(request.transformation_type, &request.content);
        let completion = self
            .provider
            .complete(&CompletionRequest::prompt(
                prompt.combined(),
                generation_settings(tag),
            ))
            .await?;

        info!(
            transformation_type = tag,
            content_length = request.content.len(),
            "Content transformed successfully"
        );

        Ok(
            TransformationResult::new(&request.title, tag, completion.text)
                .with_original_content(&request.content),
        )
    }

    /// The `content-transformer` wire contract; unknown tags get the generic
    /// template instead of an error
    pub async fn handle(&self, request: TransformContentRequest) -> Result<TransformContentResponse> {
        let (content, tag) = match (
            non_empty(request.content),
            non_empty(request.transformation_type),
        ) {
            (Some(content), Some(tag)) => (content, tag),
            _ => {
                return Err(AppError::ValidationError(
                    "Content and transformation type are required".to_string(),
                ))
            }
        };

        info!(
            transformation_type = %tag,
            content_length = content.len(),
            "Transforming content"
        );

        let prompt = build_prompt_for_tag(&tag, &content);
        let completion = self
            .provider
            .complete(&CompletionRequest::prompt(
                prompt.combined(),
                generation_settings(&tag),
            ))
            .await?;

        Ok(TransformContentResponse {
            success: true,
            transformed_content: completion.text,
            original_title: request.title,
            transformation_type: tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockProvider;
    use mindloom_shared::TransformationType;
    use pretty_assertions::assert_eq;

    fn request(content: Option<&str>, tag: Option<&str>) -> TransformContentRequest {
        TransformContentRequest {
            content: content.map(str::to_string),
            transformation_type: tag.map(str::to_string),
            title: Some("Article".to_string()),
        }
    }

    #[tokio::test]
    async fn test_handle_sends_combined_prompt() {
        let provider = Arc::new(MockProvider::answering("gemini", "A summary"));
        let transformer = ContentTransformer::new(provider.clone());

        let response = transformer
            .handle(request(Some("Body text"), Some("legal")))
            .await
            .unwrap();
        assert_eq!(
            response,
            TransformContentResponse {
                success: true,
                transformed_content: "A summary".into(),
                original_title: Some("Article".into()),
                transformation_type: "legal".into(),
            }
        );

        let sent = provider.last_request().unwrap();
        assert_eq!(sent.messages.len(), 1);
        assert!(sent.messages[0].content.ends_with("Body text"));
        assert_eq!(sent.settings.temperature, 0.3);
        assert!(sent.settings.block_harmful_content);
    }

    #[tokio::test]
    async fn test_handle_requires_content_and_type() {
        let provider = Arc::new(MockProvider::answering("gemini", "unused"));
        let transformer = ContentTransformer::new(provider.clone());

        for req in [
            request(None, Some("summary")),
            request(Some(""), Some("summary")),
            request(Some("x"), None),
        ] {
            let err = transformer.handle(req).await.unwrap_err();
            assert_eq!(err.message(), "Content and transformation type are required");
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_tag_uses_generic_template() {
        let provider = Arc::new(MockProvider::answering("gemini", "done"));
        let transformer = ContentTransformer::new(provider.clone());

        let response = transformer
            .handle(request(Some("Body"), Some("haiku")))
            .await
            .unwrap();
        assert_eq!(response.transformation_type, "haiku");
        assert!(provider.last_request().unwrap().messages[0]
            .content
            .contains("Process and transform the following content"));
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let transformer =
            ContentTransformer::new(Arc::new(MockProvider::failing("gemini", "Gemini API error: Bad Request")));
        let err = transformer
            .handle(request(Some("Body"), Some("summary")))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Gemini API error: Bad Request");
    }

    #[tokio::test]
    async fn test_typed_transform_builds_result() {
        let provider = Arc::new(MockProvider::answering("gemini", "## Branch"));
        let transformer = ContentTransformer::new(provider.clone());
        let content = "c".repeat(1500);

        let result = transformer
            .transform(&TransformationRequest::new(
                content,
                "Map",
                TransformationType::Mindmap,
            ))
            .await
            .unwrap();
        assert_eq!(result.transformation_type, "mindmap");
        assert_eq!(result.transformed_content, "## Branch");
        assert_eq!(
            result.original_content_preview.map(|p| p.chars().count()),
            Some(1000)
        );
        assert_eq!(provider.last_request().unwrap().settings.max_output_tokens, 3000);
    }
}
