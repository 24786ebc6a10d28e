//! Edge-function routes under `/functions/v1`
//!
//! Failures answer 401 for authentication problems and 500 otherwise, with
//! a `{success: false, error}` body.

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request, State},
    Json,
};
use mindloom_shared::{
    ChatRequest, ChatResponse, FileProcessRequest, FileProcessResponse, ScrapeRequest,
    ScrapeResponse, TransformContentRequest, TransformContentResponse,
};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{AppError, EdgeError};
use crate::middleware_auth::{BearerToken, ClientMeta};
use crate::AppState;

type EdgeResult<T> = std::result::Result<Json<T>, EdgeError>;

/// JSON body whose rejections follow the edge error contract
pub struct EdgeJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for EdgeJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = EdgeError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(EdgeJson(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text()).into()),
        }
    }
}

pub async fn content_transformer(
    State(state): State<AppState>,
    EdgeJson(request): EdgeJson<TransformContentRequest>,
) -> EdgeResult<TransformContentResponse> {
    Ok(Json(state.transformer.handle(request).await?))
}

pub async fn ai_chat(
    State(state): State<AppState>,
    EdgeJson(request): EdgeJson<ChatRequest>,
) -> EdgeResult<ChatResponse> {
    Ok(Json(state.qa.answer(request).await?))
}

pub async fn file_processor(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    meta: ClientMeta,
    EdgeJson(request): EdgeJson<FileProcessRequest>,
) -> EdgeResult<FileProcessResponse> {
    let response = state
        .file_processor
        .process(request, token.as_deref(), &meta)
        .await?;
    Ok(Json(response))
}

pub async fn content_scraper(
    State(state): State<AppState>,
    EdgeJson(request): EdgeJson<ScrapeRequest>,
) -> EdgeResult<ScrapeResponse> {
    let url = request
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("URL is required".to_string()))?;

    let acquired = state.scraper.scrape(&url).await?;
    info!(chars = acquired.content.len(), "Scraped {}", url);

    Ok(Json(ScrapeResponse {
        success: true,
        content: acquired.content,
        title: acquired.title,
        url: acquired.url.unwrap_or(url),
    }))
}
