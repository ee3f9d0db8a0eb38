// AI tutoring pipeline: prompt building, model round trips, response
// extraction, and answer evaluation.
// All model calls go through llm_client::ModelGateway.

pub mod evaluation;
pub mod extractor;
pub mod generator;
pub mod handlers;
pub mod models;
pub mod prompts;

use thiserror::Error;

use crate::llm_client::LlmError;
use crate::tutor::evaluation::EvaluationError;
use crate::tutor::extractor::ExtractionError;

/// Any failure of a tutor operation. Kept apart internally for logging and
/// tests; the HTTP boundary collapses it into one message.
#[derive(Debug, Error)]
pub enum AiError {
    #[error(transparent)]
    Gateway(#[from] LlmError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl AiError {
    pub fn kind(&self) -> &'static str {
        match self {
            AiError::Gateway(_) => "gateway",
            AiError::Extraction(_) => "extraction",
            AiError::Evaluation(_) => "evaluation",
        }
    }
}
