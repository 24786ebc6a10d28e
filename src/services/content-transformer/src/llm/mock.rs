use async_trait::async_trait;
use std::sync::Mutex;

use super::{Completion, CompletionProvider, CompletionRequest};
use crate::error::{AppError, Result};

/// Scripted provider that records every request it receives
pub struct MockProvider {
    name: &'static str,
    configured: bool,
    reply: std::result::Result<String, String>,
    related_questions: Vec<String>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    pub fn answering(name: &'static str, text: &str) -> Self {
        Self {
            name,
            configured: true,
            reply: Ok(text.to_string()),
            related_questions: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &'static str, error: &str) -> Self {
        Self {
            reply: Err(error.to_string()),
            ..Self::answering(name, "")
        }
    }

    pub fn unconfigured(name: &'static str) -> Self {
        Self {
            configured: false,
            ..Self::answering(name, "")
        }
    }

    pub fn with_related_questions(mut self, questions: &[&str]) -> Self {
        self.related_questions = questions.iter().map(|q| q.to_string()).collect();
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(Completion {
                text: text.clone(),
                related_questions: self.related_questions.clone(),
                provider: self.name,
            }),
            Err(message) => Err(AppError::LlmError(message.clone())),
        }
    }
}
