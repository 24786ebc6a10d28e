//! Transformation history
//!
//! Signed-in users keep their history in the `transformations` table. Each
//! anonymous session has its own bounded in-memory list that forgets the
//! oldest entries.

use async_trait::async_trait;
use chrono::NaiveDate;
use mindloom_shared::TransformationResult;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::supabase::{NewTransformation, Session, SupabaseClient};

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Stores a result and returns it as persisted (ids may be reassigned)
    async fn save(&self, result: TransformationResult) -> Result<TransformationResult>;

    /// Newest first
    async fn list(&self) -> Result<Vec<TransformationResult>>;

    async fn get(&self, id: &str) -> Result<Option<TransformationResult>>;

    /// Whether an entry was removed
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn clear(&self) -> Result<()>;
}

pub struct LocalHistory {
    capacity: usize,
    entries: RwLock<VecDeque<TransformationResult>>,
}

impl LocalHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }
}

#[async_trait]
impl HistoryStore for LocalHistory {
    async fn save(&self, result: TransformationResult) -> Result<TransformationResult> {
        let mut entries = self.entries.write().await;
        entries.push_front(result.clone());
        entries.truncate(self.capacity);
        debug!(len = entries.len(), "Saved local transformation {}", result.id);
        Ok(result)
    }

    async fn list(&self) -> Result<Vec<TransformationResult>> {
        Ok(self.entries.read().await.iter().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<TransformationResult>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        Ok(entries.len() != before)
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// History of one signed-in user
pub struct RemoteHistory {
    client: Arc<SupabaseClient>,
    session: Session,
}

impl RemoteHistory {
    pub fn new(client: Arc<SupabaseClient>, session: Session) -> Self {
        Self { client, session }
    }
}

#[async_trait]
impl HistoryStore for RemoteHistory {
    async fn save(&self, result: TransformationResult) -> Result<TransformationResult> {
        let row = self
            .client
            .insert_transformation(
                &NewTransformation {
                    user_id: self.session.user_id().to_string(),
                    file_upload_id: result.file_upload_id.clone(),
                    title: result.title.clone(),
                    transformation_type: result.transformation_type.clone(),
                    original_content: result.original_content_preview.clone(),
                    transformed_content: result.transformed_content.clone(),
                },
                self.session.token(),
            )
            .await?;

        info!("Saved transformation {} for user {}", row.id, row.user_id);
        let saved: TransformationResult = row.into();
        Ok(TransformationResult {
            url: result.url,
            related_questions: result.related_questions,
            ..saved
        })
    }

    async fn list(&self) -> Result<Vec<TransformationResult>> {
        let rows = self
            .client
            .list_transformations(self.session.user_id(), self.session.token())
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<TransformationResult>> {
        match self
            .client
            .get_transformation(id, self.session.user_id(), self.session.token())
            .await
        {
            Ok(row) => Ok(Some(row.into())),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.client
            .delete_transformation(id, self.session.user_id(), self.session.token())
            .await
    }

    async fn clear(&self) -> Result<()> {
        self.client
            .clear_transformations(self.session.user_id(), self.session.token())
            .await
    }
}

/// Pretty-printed JSON array of the given history
pub fn export_json(entries: &[TransformationResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("mindloom-transformations-{}.json", date.format("%Y-%m-%d"))
}
