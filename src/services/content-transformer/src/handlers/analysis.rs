//! Local heuristics, previews, translation and exports

use axum::Json;
use mindloom_shared::AnalyzeRequest;
use serde::Serialize;

use crate::analyzers::analytics::{self, AnalyticsReport};
use crate::analyzers::language::{self, Language};
use crate::analyzers::legal::{self, LegalAnalysis};
use crate::analyzers::mindmap::{self, MindMap};
use crate::analyzers::preview::{self, LegalPreview, QuickSummary};
use crate::analyzers::study_notes::{self, StudyNotes};
use crate::error::{AppError, Result};
use crate::export::{self, ExportDocument};
use crate::translation::{self, TranslateRequest, Translation};

const UNTITLED: &str = "Untitled";

fn title_of(request: &AnalyzeRequest) -> &str {
    request
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(UNTITLED)
}

#[derive(Debug, Serialize)]
pub struct LanguageScore {
    pub code: &'static str,
    pub score: usize,
}

#[derive(Debug, Serialize)]
pub struct LanguageDetection {
    pub detected: Language,
    pub scores: Vec<LanguageScore>,
}

pub async fn analytics(Json(request): Json<AnalyzeRequest>) -> Json<AnalyticsReport> {
    Json(analytics::analyze(&request.content))
}

pub async fn legal(Json(request): Json<AnalyzeRequest>) -> Json<LegalAnalysis> {
    Json(legal::analyze(&request.content))
}

pub async fn mindmap(Json(request): Json<AnalyzeRequest>) -> Json<MindMap> {
    Json(mindmap::build(&request.content, title_of(&request)))
}

pub async fn notes(Json(request): Json<AnalyzeRequest>) -> Json<StudyNotes> {
    Json(study_notes::generate(&request.content, title_of(&request)))
}

pub async fn language(Json(request): Json<AnalyzeRequest>) -> Result<Json<LanguageDetection>> {
    let code = language::detect(&request.content);
    let detected = *language::find(code).ok_or_else(|| {
        AppError::InternalServerError(format!("Detected unsupported language {}", code))
    })?;

    let scores = language::scores(&request.content)
        .into_iter()
        .map(|(code, score)| LanguageScore { code, score })
        .collect();

    Ok(Json(LanguageDetection { detected, scores }))
}

pub async fn preview_summary(Json(request): Json<AnalyzeRequest>) -> Json<QuickSummary> {
    Json(preview::quick_summary(&request.content, title_of(&request)))
}

pub async fn preview_legal(Json(request): Json<AnalyzeRequest>) -> Json<LegalPreview> {
    Json(preview::legal_preview(&request.content, title_of(&request)))
}

pub async fn translate(Json(request): Json<TranslateRequest>) -> Result<Json<Translation>> {
    Ok(Json(run_translation(&request)?))
}

fn run_translation(request: &TranslateRequest) -> Result<Translation> {
    translation::translate(
        &request.content,
        request.title.as_deref().unwrap_or(UNTITLED),
        request.source_language.as_deref(),
        &request.target_language,
    )
}

pub async fn export_notes(Json(request): Json<AnalyzeRequest>) -> ExportDocument {
    export::export_notes(&study_notes::generate(&request.content, title_of(&request)))
}

pub async fn export_legal(Json(request): Json<AnalyzeRequest>) -> ExportDocument {
    export::export_legal(title_of(&request), &legal::analyze(&request.content))
}

pub async fn export_mindmap(Json(request): Json<AnalyzeRequest>) -> ExportDocument {
    export::export_mindmap(&mindmap::build(&request.content, title_of(&request)))
}

pub async fn export_translation(Json(request): Json<TranslateRequest>) -> Result<ExportDocument> {
    let translation = run_translation(&request)?;
    Ok(export::export_translation(
        request.title.as_deref().unwrap_or(UNTITLED),
        &translation,
    ))
}
