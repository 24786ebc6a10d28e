use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use mindloom_shared::TransformationType;
use serde::Serialize;

use crate::analyzers::language::{Language, SUPPORTED_LANGUAGES};
use crate::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub gemini: bool,
    pub perplexity: bool,
    pub supabase: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformationCapability {
    pub tag: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapabilitiesResponse {
    pub version: &'static str,
    pub transformation_types: Vec<TransformationCapability>,
    pub languages: Vec<Language>,
    pub daily_limit: u32,
    pub max_files_per_batch: usize,
    pub max_upload_bytes: u64,
}

/// Healthy when Gemini has credentials, degraded otherwise
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let gemini = state.gemini.is_configured();

    Json(HealthStatus {
        status: if gemini { "healthy" } else { "degraded" },
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        gemini,
        perplexity: state.perplexity.is_configured(),
        supabase: state.supabase.is_some(),
    })
}

pub async fn get_capabilities(State(state): State<AppState>) -> Json<CapabilitiesResponse> {
    let limits = &state.config.limits;

    Json(CapabilitiesResponse {
        version: env!("CARGO_PKG_VERSION"),
        transformation_types: TransformationType::ALL
            .iter()
            .map(|t| TransformationCapability {
                tag: t.as_str(),
                label: t.label(),
            })
            .collect(),
        languages: SUPPORTED_LANGUAGES.to_vec(),
        daily_limit: limits.daily_transformations,
        max_files_per_batch: limits.max_files_per_batch,
        max_upload_bytes: limits.max_upload_bytes,
    })
}
