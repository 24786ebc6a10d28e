//! Upload checks applied before any file is read or stored

use std::path::Path;
use thiserror::Error;

pub const MAX_FILE_NAME_CHARS: usize = 255;

pub const DEFAULT_ALLOWED_TYPES: [&str; 16] = [
    "text/plain",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "audio/mpeg",
    "audio/wav",
    "audio/mp4",
    "video/mp4",
    "video/avi",
    "video/quicktime",
    "application/json",
    "text/csv",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
];

pub const BLOCKED_EXTENSIONS: [&str; 20] = [
    "exe", "bat", "cmd", "scr", "pif", "com", "msi", "dll", "app", "deb", "rpm", "dmg", "pkg",
    "ps1", "sh", "vbs", "js", "jar", "apk", "ipa",
];

const WILDCARD: &str = "*/*";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileRejection {
    #[error("File size must be less than {0}MB")]
    TooLarge(u64),

    #[error("File is empty")]
    Empty,

    #[error("File type {mime_type} is not supported. Allowed types: {allowed}")]
    UnsupportedType { mime_type: String, allowed: String },

    #[error("File name is too long (max 255 characters)")]
    NameTooLong,

    #[error("File type not allowed for security reasons")]
    BlockedExtension,

    #[error("Invalid image file format")]
    InvalidImage,

    #[error("Invalid PDF file format")]
    InvalidPdf,
}

#[derive(Debug, Clone)]
pub struct FileValidator {
    max_bytes: u64,
    allowed_types: Vec<String>,
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(15 * 1024 * 1024)
    }
}

impl FileValidator {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            allowed_types: DEFAULT_ALLOWED_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn with_allowed_types(mut self, allowed_types: Vec<String>) -> Self {
        self.allowed_types = allowed_types;
        self
    }

    fn is_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types
            .iter()
            .any(|allowed| allowed == mime_type || allowed == WILDCARD)
    }

    /// Checks run in a fixed order and the first failure is reported
    pub fn validate(
        &self,
        file_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<(), FileRejection> {
        let size = data.len() as u64;
        if size > self.max_bytes {
            return Err(FileRejection::TooLarge(self.max_bytes / (1024 * 1024)));
        }

        if size == 0 {
            return Err(FileRejection::Empty);
        }

        if !self.is_allowed(mime_type) {
            return Err(FileRejection::UnsupportedType {
                mime_type: mime_type.to_string(),
                allowed: self.allowed_types.join(", "),
            });
        }

        if file_name.chars().count() > MAX_FILE_NAME_CHARS {
            return Err(FileRejection::NameTooLong);
        }

        if has_blocked_extension(file_name) {
            return Err(FileRejection::BlockedExtension);
        }

        if mime_type.starts_with("image/") && !image_signature_matches(data, mime_type) {
            return Err(FileRejection::InvalidImage);
        }

        if mime_type == "application/pdf" && !pdf_signature_matches(data) {
            return Err(FileRejection::InvalidPdf);
        }

        Ok(())
    }
}

pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Checks the text after the last `.`, or the whole name when there is no
/// dot, so `.sh` and a bare `exe` are caught too
pub fn has_blocked_extension(file_name: &str) -> bool {
    let last = file_name.rsplit('.').next().unwrap_or(file_name);
    BLOCKED_EXTENSIONS.contains(&last.to_lowercase().as_str())
}

/// Magic-byte check for the image types we accept; other image types pass
pub fn image_signature_matches(data: &[u8], mime_type: &str) -> bool {
    match mime_type {
        "image/jpeg" => data.starts_with(b"\xFF\xD8\xFF"),
        "image/png" => data.starts_with(b"\x89PNG\r\n\x1A\n"),
        "image/gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
        "image/webp" => data.starts_with(b"RIFF"),
        _ => true,
    }
}

pub fn pdf_signature_matches(data: &[u8]) -> bool {
    data.starts_with(b"%PDF-")
}
