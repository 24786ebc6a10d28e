//! Question answering over a piece of content
//!
//! Perplexity answers first when it has credentials. Any failure, or an empty
//! answer, hands the same conversation to Gemini as a single flattened prompt.

use mindloom_shared::{ChatRequest, ChatResponse};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{AppError, Result};
use crate::llm::{Completion, CompletionProvider, CompletionRequest, GenerationSettings};
use crate::prompts::{build_chat_messages, flatten_conversation};

const CONTEXT_FOLLOW_UPS: [&str; 3] = [
    "Can you explain more about the main topic?",
    "What are the key takeaways from this content?",
    "How does this relate to other similar topics?",
];

fn primary_settings() -> GenerationSettings {
    GenerationSettings {
        temperature: 0.2,
        top_p: 0.9,
        max_output_tokens: 1000,
        ..GenerationSettings::default()
    }
}

const NO_ANSWER_GENERATED: &str = "No answer generated";

fn fallback_settings() -> GenerationSettings {
    GenerationSettings::default()
        .with_temperature(0.3)
        .with_max_output_tokens(1000)
        .with_empty_placeholder(NO_ANSWER_GENERATED)
}

pub struct QaService {
    primary: Arc<dyn CompletionProvider>,
    fallback: Arc<dyn CompletionProvider>,
}

impl QaService {
    pub fn new(primary: Arc<dyn CompletionProvider>, fallback: Arc<dyn CompletionProvider>) -> Self {
        Self { primary, fallback }
    }

    async fn ask_primary(&self, request: &CompletionRequest) -> Option<Completion> {
        if !self.primary.is_configured() {
            return None;
        }

        match self.primary.complete(request).await {
            Ok(completion) if !completion.text.is_empty() => Some(completion),
            Ok(_) => {
                warn!("{} returned an empty answer, falling back", self.primary.name());
                None
            }
            Err(e) => {
                warn!("{} error, trying {} fallback: {}", self.primary.name(), self.fallback.name(), e);
                None
            }
        }
    }

    pub async fn answer(&self, request: ChatRequest) -> Result<ChatResponse> {
        let question = request
            .question
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::ValidationError("Question is required".to_string()))?;
        let context = request.context.filter(|c| !c.is_empty());

        info!(
            context_length = context.as_ref().map(String::len).unwrap_or(0),
            history = request.chat_history.len(),
            "Processing Q&A request"
        );

        let messages = build_chat_messages(&question, context.as_deref(), &request.chat_history);

        if let Some(completion) = self
            .ask_primary(&CompletionRequest::chat(messages.clone(), primary_settings()))
            .await
        {
            return Ok(ChatResponse {
                success: true,
                answer: completion.text,
                related_questions: completion.related_questions,
                question,
                provider: completion.provider.to_string(),
            });
        }

        if !self.fallback.is_configured() {
            return Err(AppError::ServiceUnavailable(
                "No AI service available to answer your question".to_string(),
            ));
        }

        let prompt = flatten_conversation(&messages);
        let completion = self
            .fallback
            .complete(&CompletionRequest::prompt(prompt, fallback_settings()))
            .await
            .map_err(|e| {
                error!("{} fallback also failed: {}", self.fallback.name(), e);
                AppError::ServiceUnavailable("Both AI services are currently unavailable".to_string())
            })?;

        let related_questions = if context.is_some() {
            CONTEXT_FOLLOW_UPS.iter().map(|q| q.to_string()).collect()
        } else {
            Vec::new()
        };

        info!(provider = completion.provider, "Q&A response generated successfully");
        Ok(ChatResponse {
            success: true,
            answer: completion.text,
            related_questions,
            question,
            provider: completion.provider.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockProvider;
    use mindloom_shared::ChatMessage;
    use pretty_assertions::assert_eq;

    fn ask(question: &str, context: Option<&str>) -> ChatRequest {
        ChatRequest {
            question: Some(question.to_string()),
            context: context.map(str::to_string),
            chat_history: vec![
                ChatMessage::user("earlier question"),
                ChatMessage::assistant("earlier answer"),
            ],
        }
    }

    #[tokio::test]
    async fn test_primary_answers_with_its_related_questions() {
        let primary = Arc::new(
            MockProvider::answering("perplexity", "42").with_related_questions(&["Why 42?"]),
        );
        let fallback = Arc::new(MockProvider::answering("gemini", "unused"));
        let service = QaService::new(primary.clone(), fallback.clone());

        let response = service.answer(ask("Meaning?", Some("ctx"))).await.unwrap();
        assert_eq!(response.answer, "42");
        assert_eq!(response.provider, "perplexity");
        assert_eq!(response.related_questions, vec!["Why 42?"]);
        assert_eq!(fallback.calls(), 0);

        let sent = primary.last_request().unwrap();
        assert_eq!(sent.messages.len(), 4);
        assert_eq!(sent.messages[0].role, "system");
        assert!(sent.messages[0].content.ends_with("Use this context to answer questions: ctx"));
        assert_eq!(sent.messages[3], ChatMessage::user("Meaning?"));
        assert_eq!(sent.settings.temperature, 0.2);
        assert_eq!(sent.settings.max_output_tokens, 1000);
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_fails() {
        let primary = Arc::new(MockProvider::failing("perplexity", "Perplexity API error: Bad Gateway"));
        let fallback = Arc::new(MockProvider::answering("gemini", "fallback answer"));
        let service = QaService::new(primary, fallback.clone());

        let response = service.answer(ask("Meaning?", Some("ctx"))).await.unwrap();
        assert_eq!(response.provider, "gemini");
        assert_eq!(response.answer, "fallback answer");
        assert_eq!(response.related_questions.len(), 3);

        let sent = fallback.last_request().unwrap();
        assert_eq!(sent.messages.len(), 1);
        assert!(sent.messages[0].content.starts_with("system: You are an AI assistant"));
        assert!(sent.messages[0].content.contains("\n\nuser: Meaning?\n\n"));
        assert_eq!(sent.settings.temperature, 0.3);
        assert_eq!(sent.settings.empty_placeholder, NO_ANSWER_GENERATED);
    }

    #[tokio::test]
    async fn test_empty_primary_answer_falls_back_without_context_questions() {
        let primary = Arc::new(MockProvider::answering("perplexity", ""));
        let fallback = Arc::new(MockProvider::answering("gemini", "answer"));
        let service = QaService::new(primary, fallback);

        let response = service.answer(ask("Meaning?", None)).await.unwrap();
        assert_eq!(response.provider, "gemini");
        assert!(response.related_questions.is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_primary_is_skipped() {
        let primary = Arc::new(MockProvider::unconfigured("perplexity"));
        let fallback = Arc::new(MockProvider::answering("gemini", "answer"));
        let service = QaService::new(primary.clone(), fallback);

        service.answer(ask("Meaning?", None)).await.unwrap();
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test]
    async fn test_error_messages() {
        let service = QaService::new(
            Arc::new(MockProvider::failing("perplexity", "down")),
            Arc::new(MockProvider::failing("gemini", "down")),
        );
        let err = service.answer(ask("Q", None)).await.unwrap_err();
        assert_eq!(err.message(), "Both AI services are currently unavailable");

        let service = QaService::new(
            Arc::new(MockProvider::unconfigured("perplexity")),
            Arc::new(MockProvider::unconfigured("gemini")),
        );
        let err = service.answer(ask("Q", None)).await.unwrap_err();
        assert_eq!(err.message(), "No AI service available to answer your question");

        let err = service.answer(ChatRequest::default()).await.unwrap_err();
        assert_eq!(err.message(), "Question is required");
    }
}
