//! Shared type definitions for the MindLoom services
//!
//! `core` holds the domain records, `api` the JSON contracts spoken by the
//! edge functions and their callers.

pub mod api;
pub mod core;

pub use self::core::{
    truncate_chars, FileKind, TransformationRequest, TransformationResult, TransformationType,
    UnknownTransformationType, UploadedFile, ORIGINAL_CONTENT_PREVIEW_CHARS,
    UPLOAD_PREVIEW_CHARS,
};

pub use self::api::{
    AnalyzeRequest, ChatMessage, ChatRequest, ChatResponse, FileProcessRequest,
    FileProcessResponse, ScrapeRequest, ScrapeResponse, TransformContentRequest,
    TransformContentResponse,
};
