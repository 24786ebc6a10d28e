use axum::{
    extract::{Multipart, State},
    Json,
};
use mindloom_shared::UploadedFile;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::acquisition::{accept_text, combine_files, AcquiredContent};
use crate::error::Result;
use crate::files::{IncomingFile, SkippedFile};
use crate::middleware_auth::MaybeSession;
use crate::AppState;

const DEFAULT_MIME: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub struct PasteRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub files: Vec<UploadedFile>,
    pub skipped: Vec<SkippedFile>,
    /// All accepted files as one blob, ready to transform
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined: Option<AcquiredContent>,
}

/// `POST /v1/files`: every multipart field carrying a file name is an upload
pub async fn upload(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut incoming = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!("Ignoring multipart field {:?} without a file name", field.name());
            continue;
        };
        let mime_type = field.content_type().unwrap_or(DEFAULT_MIME).to_string();
        let data = field.bytes().await?;
        incoming.push(IncomingFile::new(file_name, mime_type, data));
    }

    let outcome = state.file_intake.process(incoming, session.as_ref()).await?;
    let combined = if outcome.files.is_empty() {
        None
    } else {
        Some(combine_files(&outcome.files)?)
    };

    Ok(Json(UploadResponse {
        success: !outcome.files.is_empty(),
        files: outcome.files,
        skipped: outcome.skipped,
        combined,
    }))
}

/// `POST /v1/text`: pasted text, trimmed and checked for a minimum length
pub async fn paste(Json(request): Json<PasteRequest>) -> Result<Json<AcquiredContent>> {
    Ok(Json(accept_text(&request.text)?))
}
