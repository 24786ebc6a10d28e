//! JSON request and response bodies for the MindLoom edge functions
//!
//! Request fields are optional on the wire so handlers can report missing
//! values with their own messages instead of a generic deserialization error.

use serde::{Deserialize, Serialize};

// =============================================================================
// content-transformer
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformContentRequest {
    pub content: Option<String>,
    pub transformation_type: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformContentResponse {
    pub success: bool,
    pub transformed_content: String,
    pub original_title: Option<String>,
    pub transformation_type: String,
}

// =============================================================================
// ai-chat
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: Option<String>,
    pub context: Option<String>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    pub answer: String,
    pub related_questions: Vec<String>,
    pub question: String,
    pub provider: String,
}

// =============================================================================
// file-processor
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProcessRequest {
    pub file_id: Option<String>,
    pub transformation_type: Option<String>,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProcessResponse {
    pub success: bool,
    pub transformed_content: String,
    pub transformation_type: String,
    pub title: String,
    pub transformation_id: Option<String>,
}

// =============================================================================
// content-scraper
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub content: String,
    pub title: String,
    pub url: String,
}

// =============================================================================
// Local analyzers
// =============================================================================

/// Body accepted by the heuristic analyzer endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transform_request_accepts_missing_fields() {
        let request: TransformContentRequest = serde_json::from_str(r#"{"content":"abc"}"#).unwrap();
        assert_eq!(request.content.as_deref(), Some("abc"));
        assert!(request.transformation_type.is_none());
    }

    #[test]
    fn test_chat_request_reads_camel_case_history() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"question":"why?","chatHistory":[{"role":"user","content":"hi"}]}"#,
        )
        .unwrap();
        assert_eq!(request.chat_history, vec![ChatMessage::user("hi")]);
        assert!(request.context.is_none());
    }

    #[test]
    fn test_file_process_response_shape() {
        let response = FileProcessResponse {
            success: true,
            transformed_content: "done".into(),
            transformation_type: "summary".into(),
            title: "summary of a.pdf".into(),
            transformation_id: Some("t-1".into()),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["transformedContent"], "done");
        assert_eq!(value["transformationId"], "t-1");
    }
}
