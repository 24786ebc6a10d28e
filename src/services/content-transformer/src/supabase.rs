//! Typed client for the Supabase project backing MindLoom
//!
//! Covers the slices of PostgREST, Storage, Auth and RPC the service needs.
//! Requests carry the caller's access token when there is one and fall back
//! to the anon key otherwise, so row-level security applies as usual.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use mindloom_shared::{SupabaseConfig, TransformationResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{AppError, Result};

pub const UPLOADS_BUCKET: &str = "uploads";
const PGRST_OBJECT: &str = "application/vnd.pgrst.object+json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated caller and the token used to act on their behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: AuthUser,
    pub access_token: String,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn token(&self) -> Option<&str> {
        Some(self.access_token.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUploadRow {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub storage_path: String,
    #[serde(default)]
    pub content_preview: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewFileUpload {
    pub user_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub storage_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRow {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub file_upload_id: Option<String>,
    pub title: String,
    pub transformation_type: String,
    #[serde(default)]
    pub original_content: Option<String>,
    pub transformed_content: String,
    pub created_at: DateTime<Utc>,
}

impl From<TransformationRow> for TransformationResult {
    fn from(row: TransformationRow) -> Self {
        TransformationResult {
            id: row.id,
            title: row.title,
            transformation_type: row.transformation_type,
            transformed_content: row.transformed_content,
            created_at: row.created_at,
            original_content_preview: row.original_content,
            related_questions: Vec::new(),
            url: None,
            file_upload_id: row.file_upload_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTransformation {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_upload_id: Option<String>,
    pub title: String,
    pub transformation_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    pub transformed_content: String,
}

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// `None` when the project URL or anon key is missing
    pub fn from_config(config: &SupabaseConfig) -> Result<Option<Self>> {
        match (&config.url, &config.anon_key) {
            (Some(url), Some(key)) if config.is_configured() => {
                let client = Client::builder()
                    .timeout(config.timeout())
                    .build()
                    .map_err(|e| {
                        AppError::InternalServerError(format!(
                            "Failed to create HTTP client: {}",
                            e
                        ))
                    })?;
                Ok(Some(Self {
                    client,
                    base_url: url.trim_end_matches('/').to_string(),
                    anon_key: key.clone(),
                }))
            }
            _ => Ok(None),
        }
    }

    pub fn is_anon_key(&self, token: &str) -> bool {
        token == self.anon_key
    }

    fn authorized(&self, builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(&self.anon_key))
    }

    fn rest(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn ensure_success(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("{} failed with {}: {}", context, status, body);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                AppError::Unauthorized(format!("{}: {}", context, status))
            }
            StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE => {
                AppError::NotFound(context.to_string())
            }
            _ => AppError::StorageError(format!("{}: {} {}", context, status, body)),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| AppError::StorageError(format!("{}: invalid response: {}", context, e)))
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// Resolves the user owning an access token
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .authorized(
                self.client.get(format!("{}/auth/v1/user", self.base_url)),
                Some(access_token),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Unauthorized(if body.is_empty() {
                status.to_string()
            } else {
                body
            }));
        }

        Self::read_json(response, "Failed to read user").await
    }

    // ------------------------------------------------------------------
    // file_uploads
    // ------------------------------------------------------------------

    pub async fn fetch_file_upload(&self, id: &str, token: Option<&str>) -> Result<FileUploadRow> {
        let response = self
            .authorized(self.client.get(self.rest("file_uploads")), token)
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())])
            .header("Accept", PGRST_OBJECT)
            .send()
            .await?;

        let response = Self::ensure_success(response, "File not found").await?;
        Self::read_json(response, "File not found").await
    }

    pub async fn insert_file_upload(
        &self,
        row: &NewFileUpload,
        token: Option<&str>,
    ) -> Result<FileUploadRow> {
        let response = self
            .authorized(self.client.post(self.rest("file_uploads")), token)
            .header("Prefer", "return=representation")
            .header("Accept", PGRST_OBJECT)
            .json(row)
            .send()
            .await?;

        let response = Self::ensure_success(response, "Failed to save file record").await?;
        Self::read_json(response, "Failed to save file record").await
    }

    // ------------------------------------------------------------------
    // Storage
    // ------------------------------------------------------------------

    pub async fn download(&self, bucket: &str, path: &str, token: Option<&str>) -> Result<Bytes> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)),
                token,
            )
            .send()
            .await?;

        let response = Self::ensure_success(response, "Failed to download file").await?;
        Ok(response.bytes().await?)
    }

    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        body: Bytes,
        content_type: &str,
        token: Option<&str>,
    ) -> Result<()> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)),
                token,
            )
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await?;

        Self::ensure_success(response, "Failed to upload file").await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // transformations
    // ------------------------------------------------------------------

    pub async fn insert_transformation(
        &self,
        row: &NewTransformation,
        token: Option<&str>,
    ) -> Result<TransformationRow> {
        let response = self
            .authorized(self.client.post(self.rest("transformations")), token)
            .header("Prefer", "return=representation")
            .header("Accept", PGRST_OBJECT)
            .json(row)
            .send()
            .await?;

        let response = Self::ensure_success(response, "Failed to save transformation").await?;
        Self::read_json(response, "Failed to save transformation").await
    }

    /// Newest first
    pub async fn list_transformations(
        &self,
        user_id: &str,
        token: Option<&str>,
    ) -> Result<Vec<TransformationRow>> {
        let response = self
            .authorized(self.client.get(self.rest("transformations")), token)
            .query(&[
                ("user_id", format!("eq.{}", user_id)),
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await?;

        let response = Self::ensure_success(response, "Failed to load transformations").await?;
        Self::read_json(response, "Failed to load transformations").await
    }

    pub async fn get_transformation(
        &self,
        id: &str,
        user_id: &str,
        token: Option<&str>,
    ) -> Result<TransformationRow> {
        let response = self
            .authorized(self.client.get(self.rest("transformations")), token)
            .query(&[
                ("id", format!("eq.{}", id)),
                ("user_id", format!("eq.{}", user_id)),
                ("select", "*".to_string()),
            ])
            .header("Accept", PGRST_OBJECT)
            .send()
            .await?;

        let response = Self::ensure_success(response, "Transformation not found").await?;
        Self::read_json(response, "Transformation not found").await
    }

    /// Returns whether a row was removed
    pub async fn delete_transformation(
        &self,
        id: &str,
        user_id: &str,
        token: Option<&str>,
    ) -> Result<bool> {
        let response = self
            .authorized(self.client.delete(self.rest("transformations")), token)
            .query(&[
                ("id", format!("eq.{}", id)),
                ("user_id", format!("eq.{}", user_id)),
            ])
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let response = Self::ensure_success(response, "Failed to delete transformation").await?;
        let deleted: Vec<Value> = Self::read_json(response, "Failed to delete transformation").await?;
        Ok(!deleted.is_empty())
    }

    pub async fn clear_transformations(&self, user_id: &str, token: Option<&str>) -> Result<()> {
        let response = self
            .authorized(self.client.delete(self.rest("transformations")), token)
            .query(&[("user_id", format!("eq.{}", user_id))])
            .send()
            .await?;

        Self::ensure_success(response, "Failed to clear history").await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // RPC
    // ------------------------------------------------------------------

    pub async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        args: &Value,
        token: Option<&str>,
    ) -> Result<T> {
        let response = self
            .authorized(self.client.post(self.rest(&format!("rpc/{}", function))), token)
            .json(args)
            .send()
            .await?;

        let context = format!("RPC {} failed", function);
        let response = Self::ensure_success(response, &context).await?;
        Self::read_json(response, &context).await
    }

    /// Whether the caller may upload `total_size` more bytes today
    pub async fn check_upload_limits(&self, total_size: u64, token: Option<&str>) -> Result<bool> {
        self.rpc("check_upload_limits", &json!({ "p_file_size": total_size }), token)
            .await
    }

    /// Best effort audit log; failures are only reported in the service log
    pub async fn log_security_event(
        &self,
        action: &str,
        resource_type: &str,
        metadata: Value,
        token: Option<&str>,
    ) {
        let args = json!({
            "p_action": action,
            "p_resource_type": resource_type,
            "p_metadata": metadata,
        });

        if let Err(e) = self.rpc::<Value>("log_security_event", &args, token).await {
            warn!("Failed to log security event {}: {}", action, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> SupabaseClient {
        SupabaseClient::from_config(&SupabaseConfig::new(server.uri(), "anon-key"))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_unconfigured_project_yields_none() {
        assert!(SupabaseClient::from_config(&SupabaseConfig::default())
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_get_user_forwards_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-1", "email": "a@b.c", "aud": "authenticated"
            })))
            .mount(&server)
            .await;

        let user = client_for(&server).await.get_user("user-token").await.unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email.as_deref(), Some("a@b.c"));
    }

    #[tokio::test]
    async fn test_get_user_rejects_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid JWT"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.get_user("bad").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "invalid JWT"));
    }

    #[tokio::test]
    async fn test_fetch_file_upload_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/file_uploads"))
            .and(query_param("id", "eq.missing"))
            .respond_with(ResponseTemplate::new(406))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .fetch_file_upload("missing", None)
            .await
            .unwrap_err();
        assert_eq!(err.message(), "File not found");
    }

    #[tokio::test]
    async fn test_list_transformations_orders_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/transformations"))
            .and(query_param("user_id", "eq.user-1"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "t-1",
                "user_id": "user-1",
                "file_upload_id": null,
                "title": "Summary",
                "transformation_type": "summary",
                "original_content": "source",
                "transformed_content": "result",
                "created_at": "2024-05-01T10:00:00Z"
            }])))
            .mount(&server)
            .await;

        let rows = client_for(&server)
            .await
            .list_transformations("user-1", Some("token"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        let result: TransformationResult = rows.into_iter().next().unwrap().into();
        assert_eq!(result.id, "t-1");
        assert_eq!(result.original_content_preview.as_deref(), Some("source"));
    }

    #[tokio::test]
    async fn test_check_upload_limits_sends_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/check_upload_limits"))
            .and(body_json(json!({ "p_file_size": 2048 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
            .mount(&server)
            .await;

        let allowed = client_for(&server)
            .await
            .check_upload_limits(2048, Some("token"))
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_delete_reports_whether_row_existed() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/transformations"))
            .and(query_param("id", "eq.t-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "t-1" }])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/transformations"))
            .and(query_param("id", "eq.t-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.delete_transformation("t-1", "user-1", None).await.unwrap());
        assert!(!client.delete_transformation("t-2", "user-1", None).await.unwrap());
    }
}
