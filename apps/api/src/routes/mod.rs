pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::schedule::handlers as schedule;
use crate::state::AppState;
use crate::tutor::handlers as tutor;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // AI tutor API
        .route("/api/ai/roadmap", post(tutor::handle_roadmap))
        .route("/api/ai/assessment", post(tutor::handle_assessment))
        .route("/api/ai/explain", post(tutor::handle_explain))
        .route("/api/ai/evaluate", post(tutor::handle_evaluate))
        // Scheduled assessments
        .route("/api/assessments/status", post(schedule::handle_window_status))
        .route("/api/assessments/score", post(schedule::handle_score))
        .with_state(state)
}
