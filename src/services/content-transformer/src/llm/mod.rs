//! Completion providers
//!
//! Both hosted APIs are reached through the [`CompletionProvider`] trait so
//! the chat fallback chain and the transformers can be exercised against
//! in-process fakes.

mod gemini;
mod perplexity;

#[cfg(test)]
pub(crate) mod mock;

pub use gemini::GeminiClient;
pub use perplexity::PerplexityClient;

use async_trait::async_trait;
use mindloom_shared::ChatMessage;

use crate::error::Result;

/// Sampling parameters forwarded to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Ask Gemini to block harassment and hate speech at medium severity
    pub block_harmful_content: bool,
    /// Returned when the provider answers with no text
    pub empty_placeholder: &'static str,
}

pub const NO_CONTENT_GENERATED: &str = "No content generated";

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
            block_harmful_content: false,
            empty_placeholder: NO_CONTENT_GENERATED,
        }
    }
}

impl GenerationSettings {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_empty_placeholder(mut self, placeholder: &'static str) -> Self {
        self.empty_placeholder = placeholder;
        self
    }

    pub fn with_safety(mut self) -> Self {
        self.block_harmful_content = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub settings: GenerationSettings,
}

impl CompletionRequest {
    /// A single-turn request carrying one user prompt
    pub fn prompt(text: impl Into<String>, settings: GenerationSettings) -> Self {
        Self {
            messages: vec![ChatMessage::user(text)],
            settings,
        }
    }

    pub fn chat(messages: Vec<ChatMessage>, settings: GenerationSettings) -> Self {
        Self { messages, settings }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub related_questions: Vec<String>,
    pub provider: &'static str,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name reported to clients
    fn name(&self) -> &'static str;

    /// Whether credentials are present
    fn is_configured(&self) -> bool;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}
