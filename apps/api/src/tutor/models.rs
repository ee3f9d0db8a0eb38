use serde::{Deserialize, Serialize};

/// Shown as the user's answer when the submitted index does not name an option.
pub const NO_ANSWER: &str = "No answer";

/// A multiple-choice question as extracted from model output or submitted back for grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    /// Zero-based; extraction leaves 0 when no correct-answer line was seen.
    /// Required on submitted questions: there is no default answer key.
    #[serde(rename = "correctAnswer")]
    pub correct_option_index: usize,
}

impl Question {
    pub fn correct_option(&self) -> Option<&str> {
        self.options
            .get(self.correct_option_index)
            .map(String::as_str)
    }

    /// Option text for a submitted index, `None` for negative or out-of-range indices.
    pub fn option_at(&self, index: i64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}

/// Generated assessment, serialized as `{ "questions": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrongAnswerDetail {
    #[serde(rename = "question")]
    pub question_text: String,
    #[serde(rename = "userAnswer")]
    pub user_answer_text: String,
    #[serde(rename = "correctAnswer")]
    pub correct_answer_text: String,
    #[serde(rename = "explanation")]
    pub explanation_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub score: usize,
    pub total_questions: usize,
    /// AI-written narrative.
    #[serde(rename = "feedback")]
    pub narrative_feedback: String,
    /// Rule-based, from the percentage band.
    pub detailed_feedback: String,
    pub wrong_answers: Vec<WrongAnswerDetail>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}
