//! Axum route handlers for scheduled assessments. Stateless: the caller
//! supplies the schedule or answer key, nothing is persisted here.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppJson};
use crate::schedule::window::{offset_from_minutes, AssessmentWindow, WindowStatus};
use crate::state::AppState;
use crate::tutor::evaluation::count_correct;
use crate::tutor::models::Question;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRequest {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub questions: Vec<Question>,
    pub answers: Vec<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub score: usize,
    pub total_questions: usize,
}

/// POST /api/assessments/status
pub async fn handle_window_status(
    State(state): State<AppState>,
    AppJson(request): AppJson<WindowRequest>,
) -> Result<Json<WindowStatus>, AppError> {
    let offset = offset_from_minutes(state.config.assessment_utc_offset_minutes)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let window = AssessmentWindow::parse(&request.start_time, &request.end_time, offset)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(Json(window.status_at(Utc::now().with_timezone(&offset))))
}

/// POST /api/assessments/score
pub async fn handle_score(AppJson(request): AppJson<ScoreRequest>) -> Json<ScoreResponse> {
    Json(ScoreResponse {
        score: count_correct(&request.questions, &request.answers),
        total_questions: request.questions.len(),
    })
}
