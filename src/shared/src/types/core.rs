//! Core record types shared by the MindLoom services
//!
//! Transformation requests are ephemeral; results are created once per
//! successful transformation and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum characters of source text kept alongside a stored result
pub const ORIGINAL_CONTENT_PREVIEW_CHARS: usize = 1000;

/// Maximum characters of extracted text kept as an upload's preview
pub const UPLOAD_PREVIEW_CHARS: usize = 500;

// ============================================================================
// TRANSFORMATION TYPES
// ============================================================================

/// Output mode selecting a prompt template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformationType {
    Summary,
    Mindmap,
    Notes,
    Legal,
    Analysis,
    Qa,
}

impl TransformationType {
    pub const ALL: [TransformationType; 6] = [
        TransformationType::Summary,
        TransformationType::Mindmap,
        TransformationType::Notes,
        TransformationType::Legal,
        TransformationType::Analysis,
        TransformationType::Qa,
    ];

    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformationType::Summary => "summary",
            TransformationType::Mindmap => "mindmap",
            TransformationType::Notes => "notes",
            TransformationType::Legal => "legal",
            TransformationType::Analysis => "analysis",
            TransformationType::Qa => "qa",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            TransformationType::Summary => "Summary",
            TransformationType::Mindmap => "Mindmap",
            TransformationType::Notes => "Study Notes",
            TransformationType::Legal => "Legal Analysis",
            TransformationType::Analysis => "Content Analysis",
            TransformationType::Qa => "Q&A",
        }
    }
}

impl fmt::Display for TransformationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown transformation type: {0}")]
pub struct UnknownTransformationType(pub String);

impl FromStr for TransformationType {
    type Err = UnknownTransformationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" => Ok(TransformationType::Summary),
            "mindmap" => Ok(TransformationType::Mindmap),
            "notes" => Ok(TransformationType::Notes),
            "legal" => Ok(TransformationType::Legal),
            "analysis" => Ok(TransformationType::Analysis),
            "qa" => Ok(TransformationType::Qa),
            _ => Err(UnknownTransformationType(s.to_string())),
        }
    }
}

/// A single user action asking for a derivative of some content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationRequest {
    pub content: String,
    pub title: String,
    pub transformation_type: TransformationType,
}

impl TransformationRequest {
    pub fn new(
        content: impl Into<String>,
        title: impl Into<String>,
        transformation_type: TransformationType,
    ) -> Self {
        Self {
            content: content.into(),
            title: title.into(),
            transformation_type,
        }
    }
}

/// Stored outcome of a transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationResult {
    pub id: String,
    pub title: String,
    pub transformation_type: String,
    pub transformed_content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_content_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_upload_id: Option<String>,
}

impl TransformationResult {
    /// New result with a fresh id and the current timestamp
    pub fn new(
        title: impl Into<String>,
        transformation_type: impl Into<String>,
        transformed_content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            transformation_type: transformation_type.into(),
            transformed_content: transformed_content.into(),
            created_at: Utc::now(),
            original_content_preview: None,
            related_questions: Vec::new(),
            url: None,
            file_upload_id: None,
        }
    }

    /// Keep at most [`ORIGINAL_CONTENT_PREVIEW_CHARS`] of the source text
    pub fn with_original_content(mut self, content: &str) -> Self {
        self.original_content_preview =
            Some(truncate_chars(content, ORIGINAL_CONTENT_PREVIEW_CHARS));
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_related_questions(mut self, questions: Vec<String>) -> Self {
        self.related_questions = questions;
        self
    }

    pub fn with_file_upload(mut self, file_upload_id: impl Into<String>) -> Self {
        self.file_upload_id = Some(file_upload_id.into());
        self
    }
}

// ============================================================================
// UPLOADED FILES
// ============================================================================

/// Coarse file category derived from the declared mime type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Text,
    Pdf,
    Document,
    Audio,
    Video,
    Image,
    Json,
}

impl FileKind {
    /// Substring rules, first match wins
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_lowercase();
        if mime.contains("pdf") {
            FileKind::Pdf
        } else if mime.contains("word") || mime.contains("document") {
            FileKind::Document
        } else if mime.contains("audio") {
            FileKind::Audio
        } else if mime.contains("video") {
            FileKind::Video
        } else if mime.contains("image") {
            FileKind::Image
        } else if mime.contains("json") {
            FileKind::Json
        } else {
            FileKind::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Text => "text",
            FileKind::Pdf => "pdf",
            FileKind::Document => "document",
            FileKind::Audio => "audio",
            FileKind::Video => "video",
            FileKind::Image => "image",
            FileKind::Json => "json",
        }
    }

    /// Only plain text payloads get a stored preview
    pub fn keeps_preview(&self) -> bool {
        matches!(self, FileKind::Text | FileKind::Json)
    }
}

/// A validated upload converted to text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
}

impl UploadedFile {
    pub fn new(
        id: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        content: impl Into<String>,
    ) -> Self {
        let mime_type = mime_type.into();
        let content = content.into();
        let kind = FileKind::from_mime(&mime_type);
        let content_preview = kind
            .keeps_preview()
            .then(|| truncate_chars(&content, UPLOAD_PREVIEW_CHARS));

        Self {
            id: id.into(),
            file_name: file_name.into(),
            mime_type,
            size,
            kind,
            content,
            storage_path: None,
            content_preview,
        }
    }

    pub fn with_storage_path(mut self, path: impl Into<String>) -> Self {
        self.storage_path = Some(path.into());
        self
    }
}

/// Character-safe prefix of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
