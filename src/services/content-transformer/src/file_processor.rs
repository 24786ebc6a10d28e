//! Transformation of a previously uploaded file
//!
//! The caller is authenticated before anything is read from storage, and
//! their token is forwarded so row-level security scopes every lookup.

use mindloom_shared::{
    truncate_chars, FileProcessRequest, FileProcessResponse, ORIGINAL_CONTENT_PREVIEW_CHARS,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::files::extract::extract_stored;
use crate::llm::{CompletionProvider, CompletionRequest, GenerationSettings};
use crate::middleware_auth::ClientMeta;
use crate::prompts::build_file_prompt;
use crate::supabase::{AuthUser, NewTransformation, SupabaseClient, UPLOADS_BUCKET};

/// `p_resource_type` of every security event this contract records
const SECURITY_RESOURCE: &str = "file_processor";

pub struct FileProcessor {
    storage: Option<Arc<SupabaseClient>>,
    provider: Arc<dyn CompletionProvider>,
}

impl FileProcessor {
    pub fn new(storage: Option<Arc<SupabaseClient>>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { storage, provider }
    }

    async fn authenticate(
        &self,
        storage: &SupabaseClient,
        bearer: Option<&str>,
        meta: &ClientMeta,
    ) -> Result<AuthUser> {
        let token = bearer
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        match storage.get_user(token).await {
            Ok(user) => Ok(user),
            Err(e) => {
                storage
                    .log_security_event(
                        "failed_authentication",
                        SECURITY_RESOURCE,
                        json!({
                            "ip_address": meta.ip_address,
                            "user_agent": meta.user_agent,
                            "error": e.message(),
                        }),
                        None,
                    )
                    .await;
                Err(AppError::Unauthorized("Invalid authentication".to_string()))
            }
        }
    }

    pub async fn process(
        &self,
        request: FileProcessRequest,
        bearer: Option<&str>,
        meta: &ClientMeta,
    ) -> Result<FileProcessResponse> {
        let storage = self.storage.as_deref().ok_or_else(|| {
            AppError::ServiceUnavailable("File storage is not configured".to_string())
        })?;

        let (file_id, tag) = match (
            request.file_id.filter(|id| !id.is_empty()),
            request.transformation_type.filter(|t| !t.is_empty()),
        ) {
            (Some(file_id), Some(tag)) => (file_id, tag),
            _ => {
                return Err(AppError::ValidationError(
                    "File ID and transformation type are required".to_string(),
                ))
            }
        };

        let user = self.authenticate(storage, bearer, meta).await?;

        storage
            .log_security_event(
                "file_processing_requested",
                SECURITY_RESOURCE,
                json!({
                    "ip_address": meta.ip_address,
                    "user_agent": meta.user_agent,
                    "file_id": file_id,
                }),
                bearer,
            )
            .await;

        info!(file_id = %file_id, transformation_type = %tag, "Processing stored file");

        let file = storage.fetch_file_upload(&file_id, bearer).await?;
        let data = storage
            .download(UPLOADS_BUCKET, &file.storage_path, bearer)
            .await
            .map_err(|e| {
                warn!("Download of {} failed: {}", file.storage_path, e);
                AppError::StorageError("Failed to download file".to_string())
            })?;

        let content = extract_stored(&file, &data);
        let prompt = build_file_prompt(&tag, request.custom_prompt.as_deref(), &content);
        let completion = self
            .provider
            .complete(&CompletionRequest::prompt(prompt, GenerationSettings::default()))
            .await?;

        let title = format!("{} of {}", tag, file.file_name);
        let saved = storage
            .insert_transformation(
                &NewTransformation {
                    user_id: user.id.clone(),
                    file_upload_id: Some(file.id.clone()),
                    title: title.clone(),
                    transformation_type: tag.clone(),
                    original_content: Some(truncate_chars(&content, ORIGINAL_CONTENT_PREVIEW_CHARS)),
                    transformed_content: completion.text.clone(),
                },
                bearer,
            )
            .await;

        let transformation_id = match saved {
            Ok(row) => Some(row.id),
            Err(e) => {
                warn!("Failed to save transformation for file {}: {}", file.id, e);
                None
            }
        };

        info!(user_id = %user.id, "File processed successfully");
        Ok(FileProcessResponse {
            success: true,
            transformed_content: completion.text,
            transformation_type: tag,
            title,
            transformation_id,
        })
    }
}
