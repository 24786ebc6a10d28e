//! MindLoom content transformation service
//!
//! Turns URLs, pasted text and uploaded files into AI-generated summaries,
//! mind maps, study notes and analyses. The edge-function contracts live
//! under `/functions/v1`, the local heuristics and history under `/v1`.

pub mod acquisition;
pub mod analyzers;
pub mod chat;
pub mod config;
pub mod error;
pub mod export;
pub mod file_processor;
pub mod files;
pub mod handlers;
pub mod history;
pub mod llm;
pub mod middleware_auth;
pub mod prompts;
pub mod sessions;
pub mod state;
pub mod supabase;
pub mod transformer;
pub mod translation;
pub mod usage;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Multipart framing on top of the raw file bytes
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.limits.max_upload_bytes as usize
        * state.config.limits.max_files_per_batch
        + MULTIPART_OVERHEAD_BYTES;

    let edge_routes = Router::new()
        .route("/content-transformer", post(handlers::edge::content_transformer))
        .route("/ai-chat", post(handlers::edge::ai_chat))
        .route("/file-processor", post(handlers::edge::file_processor))
        .route("/content-scraper", post(handlers::edge::content_scraper));

    let api_routes = Router::new()
        .route("/analyze/analytics", post(handlers::analysis::analytics))
        .route("/analyze/legal", post(handlers::analysis::legal))
        .route("/analyze/mindmap", post(handlers::analysis::mindmap))
        .route("/analyze/notes", post(handlers::analysis::notes))
        .route("/analyze/language", post(handlers::analysis::language))
        .route("/preview/summary", post(handlers::analysis::preview_summary))
        .route("/preview/legal", post(handlers::analysis::preview_legal))
        .route("/translate", post(handlers::analysis::translate))
        .route("/export/notes", post(handlers::analysis::export_notes))
        .route("/export/legal", post(handlers::analysis::export_legal))
        .route("/export/mindmap", post(handlers::analysis::export_mindmap))
        .route("/export/translation", post(handlers::analysis::export_translation))
        .route(
            "/files",
            post(handlers::files::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/text", post(handlers::files::paste))
        .route("/transform", post(handlers::history::transform))
        .route(
            "/history",
            get(handlers::history::list)
                .post(handlers::history::save)
                .delete(handlers::history::clear),
        )
        .route("/history/export", get(handlers::history::export))
        .route(
            "/history/:id",
            get(handlers::history::get).delete(handlers::history::delete),
        )
        .route("/usage", get(handlers::history::usage))
        .route("/usage/increment", post(handlers::history::increment_usage))
        .route("/capabilities", get(handlers::system::get_capabilities));

    Router::new()
        .route("/health", get(handlers::system::health_check))
        .nest("/functions/v1", edge_routes)
        .nest("/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_logging_middleware)),
        )
        .with_state(state)
}

async fn request_logging_middleware(
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> impl IntoResponse {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start_time = std::time::Instant::now();

    let response = next.run(req).await;

    info!(
        "{} {} - {:?} - {}ms",
        method,
        uri,
        response.status(),
        start_time.elapsed().as_millis()
    );

    response
}
