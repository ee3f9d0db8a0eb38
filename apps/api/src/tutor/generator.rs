//! Single round-trip operations: roadmap, assessment, and answer explanation.
//!
//! Flow for each: build prompt → one gateway call → extract → check counts.

use serde::Deserialize;
use tracing::info;

use crate::llm_client::{LlmError, ModelGateway};
use crate::tutor::extractor::{
    extract_questions, extract_roadmap_steps, require_non_empty, ExtractionMode,
};
use crate::tutor::models::Assessment;
use crate::tutor::prompts::{
    build_assessment_prompt, build_explanation_prompt, build_roadmap_prompt, ROADMAP_STEP_COUNT,
};
use crate::tutor::AiError;

#[derive(Debug, Clone, Deserialize)]
pub struct RoadmapRequest {
    pub domain: String,
    pub timeframe: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    pub domain: String,
    pub difficulty: String,
    pub number_of_questions: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub question: String,
    pub correct_answer: String,
}

pub async fn generate_roadmap(
    gateway: &dyn ModelGateway,
    mode: ExtractionMode,
    request: &RoadmapRequest,
) -> Result<Vec<String>, AiError> {
    let prompt = build_roadmap_prompt(&request.domain, &request.timeframe, &request.difficulty);
    let raw = gateway.generate(&prompt).await?;

    let steps = extract_roadmap_steps(&raw);
    require_non_empty("roadmap content", &steps)?;
    mode.check_count("roadmap steps", ROADMAP_STEP_COUNT, steps.len())?;

    info!("Generated {}-step roadmap for {}", steps.len(), request.domain);
    Ok(steps)
}

pub async fn generate_assessment(
    gateway: &dyn ModelGateway,
    mode: ExtractionMode,
    request: &AssessmentRequest,
) -> Result<Assessment, AiError> {
    let prompt = build_assessment_prompt(
        &request.domain,
        &request.difficulty,
        request.number_of_questions,
    );
    let raw = gateway.generate(&prompt).await?;

    let questions = extract_questions(&raw);
    require_non_empty("assessment questions", &questions)?;
    mode.check_count(
        "questions",
        request.number_of_questions as usize,
        questions.len(),
    )?;
    mode.check_questions(&questions)?;

    info!(
        "Generated {} questions for {} ({} requested)",
        questions.len(),
        request.domain,
        request.number_of_questions
    );
    Ok(Assessment { questions })
}

/// The gateway already rejects blank text, so any success is a usable explanation.
pub async fn explain_answer(
    gateway: &dyn ModelGateway,
    question: &str,
    correct_answer: &str,
) -> Result<String, LlmError> {
    gateway
        .generate(&build_explanation_prompt(question, correct_answer))
        .await
}
