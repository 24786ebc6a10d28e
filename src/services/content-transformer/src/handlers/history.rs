//! Typed transformations, history and the anonymous usage counter

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use mindloom_shared::{TransformationRequest, TransformationResult, TransformationType};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, Result};
use crate::export::ExportDocument;
use crate::history;
use crate::middleware_auth::{BrowserSession, Caller};
use crate::sessions::AnonymousSession;
use crate::usage::UsageSnapshot;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    pub transformation_type: TransformationType,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveHistoryRequest {
    pub title: String,
    pub transformation_type: String,
    pub transformed_content: String,
    #[serde(default)]
    pub original_content: Option<String>,
    #[serde(default)]
    pub related_questions: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file_upload_id: Option<String>,
}

impl From<SaveHistoryRequest> for TransformationResult {
    fn from(request: SaveHistoryRequest) -> Self {
        let mut result = TransformationResult::new(
            request.title,
            request.transformation_type,
            request.transformed_content,
        )
        .with_related_questions(request.related_questions);

        if let Some(content) = &request.original_content {
            result = result.with_original_content(content);
        }
        if let Some(url) = request.url {
            result = result.with_url(url);
        }
        if let Some(file_upload_id) = request.file_upload_id {
            result = result.with_file_upload(file_upload_id);
        }
        result
    }
}

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub success: bool,
}

fn limit_reached(limit: u32) -> AppError {
    AppError::RateLimitExceeded(format!(
        "You've used all {} free transformations today",
        limit
    ))
}

/// Charges one anonymous use, failing once today's allowance is spent
async fn charge_anonymous_use(browser: &AnonymousSession, limit: u32) -> Result<UsageSnapshot> {
    let today = Utc::now().date_naive();

    let mut usage = browser.usage.write().await;
    if !usage.can_use(today, limit) {
        return Err(limit_reached(limit));
    }
    usage.increment(today);
    Ok(usage.snapshot(today, limit))
}

pub async fn transform(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<TransformRequest>,
) -> Result<(StatusCode, Json<TransformationResult>)> {
    if request.content.trim().is_empty() {
        return Err(AppError::ValidationError("Content is required".to_string()));
    }

    let limit = state.config.limits.daily_transformations;
    if let Caller::Anonymous(browser) = &caller {
        let today = Utc::now().date_naive();
        if !browser.usage.read().await.can_use(today, limit) {
            return Err(limit_reached(limit));
        }
    }

    let typed = TransformationRequest::new(
        request.content,
        request
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Untitled".to_string()),
        request.transformation_type,
    );

    let mut result = state.transformer.transform(&typed).await?;
    if let Some(url) = request.url {
        result = result.with_url(url);
    }

    if let Caller::Anonymous(browser) = &caller {
        let snapshot = charge_anonymous_use(browser, limit).await?;
        info!(remaining = snapshot.remaining, "Anonymous transformation recorded");
    }

    let saved = state.history_for(&caller)?.save(result).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<TransformationResult>>> {
    Ok(Json(state.history_for(&caller)?.list().await?))
}

pub async fn save(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<SaveHistoryRequest>,
) -> Result<(StatusCode, Json<TransformationResult>)> {
    let saved = state.history_for(&caller)?.save(request.into()).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn get(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<TransformationResult>> {
    state
        .history_for(&caller)?
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Transformation not found".to_string()))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.history_for(&caller)?.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Transformation not found".to_string()))
    }
}

pub async fn clear(State(state): State<AppState>, caller: Caller) -> Result<Json<Cleared>> {
    state.history_for(&caller)?.clear().await?;
    Ok(Json(Cleared { success: true }))
}

pub async fn export(State(state): State<AppState>, caller: Caller) -> Result<ExportDocument> {
    let entries = state.history_for(&caller)?.list().await?;
    Ok(ExportDocument {
        file_name: history::export_file_name(Utc::now().date_naive()),
        content_type: "application/json",
        body: history::export_json(&entries)?,
    })
}

pub async fn usage(
    State(state): State<AppState>,
    BrowserSession(browser): BrowserSession,
) -> Json<UsageSnapshot> {
    let today = Utc::now().date_naive();
    Json(
        browser
            .usage
            .read()
            .await
            .snapshot(today, state.config.limits.daily_transformations),
    )
}

pub async fn increment_usage(
    State(state): State<AppState>,
    BrowserSession(browser): BrowserSession,
) -> Result<Json<UsageSnapshot>> {
    Ok(Json(
        charge_anonymous_use(&browser, state.config.limits.daily_transformations).await?,
    ))
}
