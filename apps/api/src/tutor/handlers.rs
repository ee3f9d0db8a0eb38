//! Axum route handlers for the AI tutor API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::{AppError, AppJson};
use crate::state::AppState;
use crate::tutor::evaluation::{evaluate_answers, EvaluationOptions, EvaluationRequest};
use crate::tutor::generator::{
    explain_answer, generate_assessment, generate_roadmap, AssessmentRequest, ExplainRequest,
    RoadmapRequest,
};
use crate::tutor::models::{Assessment, EvaluationReport};

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RoadmapResponse {
    pub roadmap: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/roadmap
pub async fn handle_roadmap(
    State(state): State<AppState>,
    AppJson(request): AppJson<RoadmapRequest>,
) -> Result<Json<RoadmapResponse>, AppError> {
    require_text("domain", &request.domain)?;
    require_text("timeframe", &request.timeframe)?;
    require_text("difficulty", &request.difficulty)?;

    let roadmap = generate_roadmap(
        state.gateway.as_ref(),
        state.config.extraction_mode,
        &request,
    )
    .await
    .map_err(|e| AppError::ai("roadmap", e))?;

    Ok(Json(RoadmapResponse { roadmap }))
}

/// POST /api/ai/assessment
pub async fn handle_assessment(
    State(state): State<AppState>,
    AppJson(request): AppJson<AssessmentRequest>,
) -> Result<Json<Assessment>, AppError> {
    require_text("domain", &request.domain)?;
    require_text("difficulty", &request.difficulty)?;
    let max = state.config.max_questions;
    if !(1..=max).contains(&request.number_of_questions) {
        return Err(AppError::Validation(format!(
            "numberOfQuestions must be between 1 and {max}"
        )));
    }

    let assessment = generate_assessment(
        state.gateway.as_ref(),
        state.config.extraction_mode,
        &request,
    )
    .await
    .map_err(|e| AppError::ai("assessment", e))?;

    Ok(Json(assessment))
}

/// POST /api/ai/explain
pub async fn handle_explain(
    State(state): State<AppState>,
    AppJson(request): AppJson<ExplainRequest>,
) -> Result<Json<ExplainResponse>, AppError> {
    require_text("question", &request.question)?;
    require_text("correctAnswer", &request.correct_answer)?;

    let explanation = explain_answer(
        state.gateway.as_ref(),
        &request.question,
        &request.correct_answer,
    )
    .await
    .map_err(|e| AppError::ai("explanation", e))?;

    Ok(Json(ExplainResponse { explanation }))
}

/// POST /api/ai/evaluate
///
/// Malformed submissions (no questions, answer key out of range) are rejected
/// before any model call.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    AppJson(request): AppJson<EvaluationRequest>,
) -> Result<Json<EvaluationReport>, AppError> {
    require_text("domain", &request.domain)?;
    require_text("difficulty", &request.difficulty)?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let options = EvaluationOptions {
        explanation_concurrency: state.config.explanation_concurrency,
        mode: state.config.extraction_mode,
    };

    let report = evaluate_answers(state.gateway.as_ref(), &request, &options)
        .await
        .map_err(|e| {
            if e.is_invalid_input() {
                AppError::Validation(e.to_string())
            } else {
                AppError::ai("evaluation", e)
            }
        })?;

    Ok(Json(report))
}
