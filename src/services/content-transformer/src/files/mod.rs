//! File intake: validate, extract and (for signed-in users) persist uploads

pub mod extract;
pub mod validation;

use bytes::Bytes;
use chrono::Utc;
use mindloom_shared::UploadedFile;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::LimitsConfig;
use crate::error::{AppError, Result};
use crate::supabase::{NewFileUpload, Session, SupabaseClient, UPLOADS_BUCKET};
use validation::{file_extension, FileValidator};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const UPLOAD_LIMIT_MESSAGE: &str =
    "You have reached your daily upload limit. Please try again tomorrow.";

#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl IncomingFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub files: Vec<UploadedFile>,
    pub skipped: Vec<SkippedFile>,
}

/// Identifier for an upload that was never persisted
pub fn temp_file_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("temp_{}_{}", Utc::now().timestamp_millis(), suffix)
}

pub struct FileIntake {
    validator: FileValidator,
    max_files: usize,
    storage: Option<Arc<SupabaseClient>>,
}

impl FileIntake {
    pub fn new(limits: &LimitsConfig, storage: Option<Arc<SupabaseClient>>) -> Self {
        Self {
            validator: FileValidator::new(limits.max_upload_bytes),
            max_files: limits.max_files_per_batch,
            storage,
        }
    }

    /// Processes a batch sequentially
    ///
    /// Files that fail validation, extraction or persistence are reported in
    /// `skipped` and do not fail the batch.
    pub async fn process(
        &self,
        files: Vec<IncomingFile>,
        session: Option<&Session>,
    ) -> Result<BatchOutcome> {
        if files.is_empty() {
            return Err(AppError::ValidationError("No files were provided".to_string()));
        }

        if files.len() > self.max_files {
            return Err(AppError::ValidationError(format!(
                "Maximum {} files allowed at once",
                self.max_files
            )));
        }

        let persist = match (session, &self.storage) {
            (Some(session), Some(storage)) => Some((session, storage.as_ref())),
            _ => None,
        };

        if let Some((session, storage)) = persist {
            let total_size = files.iter().map(IncomingFile::size).sum();
            match storage.check_upload_limits(total_size, session.token()).await {
                Ok(true) => {}
                Ok(false) => {
                    return Err(AppError::RateLimitExceeded(UPLOAD_LIMIT_MESSAGE.to_string()))
                }
                Err(e) => {
                    warn!("Upload limit check failed: {}", e);
                    return Err(AppError::RateLimitExceeded(UPLOAD_LIMIT_MESSAGE.to_string()));
                }
            }
        }

        let mut outcome = BatchOutcome::default();
        for file in files {
            if let Err(rejection) =
                self.validator
                    .validate(&file.file_name, &file.mime_type, &file.data)
            {
                warn!("Rejected upload {}: {}", file.file_name, rejection);
                outcome.skipped.push(SkippedFile {
                    file_name: file.file_name,
                    reason: rejection.to_string(),
                });
                continue;
            }

            let content = extract::extract_upload(&file.file_name, &file.mime_type, &file.data);

            let uploaded = match persist {
                Some((session, storage)) => {
                    match self.persist(storage, session, &file, content).await {
                        Ok(uploaded) => uploaded,
                        Err(e) => {
                            warn!("Failed to save {}: {}", file.file_name, e);
                            outcome.skipped.push(SkippedFile {
                                reason: format!("Failed to save {} to database", file.file_name),
                                file_name: file.file_name,
                            });
                            continue;
                        }
                    }
                }
                None => UploadedFile::new(
                    temp_file_id(),
                    file.file_name.as_str(),
                    file.mime_type.as_str(),
                    file.size(),
                    content,
                ),
            };

            outcome.files.push(uploaded);
        }

        info!(
            processed = outcome.files.len(),
            skipped = outcome.skipped.len(),
            "Processed upload batch"
        );
        Ok(outcome)
    }

    async fn persist(
        &self,
        storage: &SupabaseClient,
        session: &Session,
        file: &IncomingFile,
        content: String,
    ) -> Result<UploadedFile> {
        let extension = file_extension(&file.file_name).unwrap_or_else(|| "bin".to_string());
        let storage_path = format!(
            "{}/{}.{}",
            session.user_id(),
            Utc::now().timestamp_millis(),
            extension
        );

        storage
            .upload(
                UPLOADS_BUCKET,
                &storage_path,
                file.data.clone(),
                &file.mime_type,
                session.token(),
            )
            .await?;

        let draft = UploadedFile::new(
            "",
            file.file_name.as_str(),
            file.mime_type.as_str(),
            file.size(),
            content,
        );

        let row = storage
            .insert_file_upload(
                &NewFileUpload {
                    user_id: session.user_id().to_string(),
                    file_name: file.file_name.clone(),
                    file_type: file.mime_type.clone(),
                    file_size: file.size(),
                    storage_path: storage_path.clone(),
                    content_preview: draft.content_preview.clone(),
                },
                session.token(),
            )
            .await?;

        Ok(UploadedFile {
            id: row.id,
            ..draft
        }
        .with_storage_path(storage_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supabase::AuthUser;
    use mindloom_shared::{FileKind, SupabaseConfig};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_file(name: &str, body: &str) -> IncomingFile {
        IncomingFile::new(name, "text/plain", Bytes::from(body.to_string()))
    }

    fn session() -> Session {
        Session {
            user: AuthUser {
                id: "user-1".into(),
                email: None,
            },
            access_token: "token".into(),
        }
    }

    #[test]
    fn test_temp_file_id_shape() {
        let id = temp_file_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "temp");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[tokio::test]
    async fn test_anonymous_batch_skips_invalid_files() {
        let intake = FileIntake::new(&LimitsConfig::default(), None);
        let outcome = intake
            .process(
                vec![
                    text_file("notes.txt", "some notes"),
                    text_file("empty.txt", ""),
                    text_file("run.sh", "echo hi"),
                ],
                None,
            )
            .await
            .unwrap();

        assert_eq!(outcome.files.len(), 1);
        assert!(outcome.files[0].id.starts_with("temp_"));
        assert_eq!(outcome.files[0].kind, FileKind::Text);
        assert_eq!(outcome.files[0].content, "some notes");
        assert_eq!(
            outcome.skipped,
            vec![
                SkippedFile {
                    file_name: "empty.txt".into(),
                    reason: "File is empty".into()
                },
                SkippedFile {
                    file_name: "run.sh".into(),
                    reason: "File type not allowed for security reasons".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_batch_size_limit() {
        let intake = FileIntake::new(&LimitsConfig::default(), None);
        let files = (0..6).map(|i| text_file(&format!("{}.txt", i), "x")).collect();
        let err = intake.process(files, None).await.unwrap_err();
        assert_eq!(err.message(), "Maximum 5 files allowed at once");
    }

    #[tokio::test]
    async fn test_authenticated_batch_persists_files() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/check_upload_limits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/uploads/user-1/\d+\.txt$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "x" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/file_uploads"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "file-42",
                "user_id": "user-1",
                "file_name": "notes.txt",
                "file_type": "text/plain",
                "file_size": 10,
                "storage_path": "user-1/1.txt",
                "content_preview": "some notes"
            })))
            .mount(&server)
            .await;

        let storage = SupabaseClient::from_config(&SupabaseConfig::new(server.uri(), "anon"))
            .unwrap()
            .map(Arc::new);
        let intake = FileIntake::new(&LimitsConfig::default(), storage);
        let outcome = intake
            .process(vec![text_file("notes.txt", "some notes")], Some(&session()))
            .await
            .unwrap();

        assert_eq!(outcome.files.len(), 1);
        let file = &outcome.files[0];
        assert_eq!(file.id, "file-42");
        assert_eq!(file.content_preview.as_deref(), Some("some notes"));
        assert!(file
            .storage_path
            .as_deref()
            .is_some_and(|p| p.starts_with("user-1/") && p.ends_with(".txt")));
    }

    #[tokio::test]
    async fn test_upload_limit_blocks_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/check_upload_limits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
            .mount(&server)
            .await;

        let storage = SupabaseClient::from_config(&SupabaseConfig::new(server.uri(), "anon"))
            .unwrap()
            .map(Arc::new);
        let intake = FileIntake::new(&LimitsConfig::default(), storage);
        let err = intake
            .process(vec![text_file("a.txt", "x")], Some(&session()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RateLimitExceeded(_)));
    }

    #[tokio::test]
    async fn test_failed_storage_upload_skips_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/check_upload_limits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/uploads/.*"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let storage = SupabaseClient::from_config(&SupabaseConfig::new(server.uri(), "anon"))
            .unwrap()
            .map(Arc::new);
        let intake = FileIntake::new(&LimitsConfig::default(), storage);
        let outcome = intake
            .process(vec![text_file("a.txt", "x")], Some(&session()))
            .await
            .unwrap();
        assert!(outcome.files.is_empty());
        assert_eq!(outcome.skipped[0].reason, "Failed to save a.txt to database");
    }
}
