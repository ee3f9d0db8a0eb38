//! Evaluation Engine. Grades submitted answers and assembles an `EvaluationReport`.
//!
//! Flow: validate → grade locally → explain each wrong answer (bounded fan-out,
//! ordered by question) → narrative / strengths / improvements (concurrent)
//! → rule-based band feedback → report.
//!
//! All-or-nothing: the first failed model call aborts the evaluation and
//! drops any calls still in flight.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::llm_client::{LlmError, ModelGateway};
use crate::tutor::extractor::{extract_feedback_items, ExtractionError, ExtractionMode};
use crate::tutor::generator::explain_answer;
use crate::tutor::models::{EvaluationReport, Question, WrongAnswerDetail, NO_ANSWER};
use crate::tutor::prompts::{
    build_feedback_prompt, build_improvements_prompt, build_strengths_prompt, ScoreSummary,
    FEEDBACK_LIST_COUNT,
};

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("No questions to evaluate")]
    NoQuestions,

    #[error("question {position} marks option {index} correct but has {options} options")]
    CorrectIndexOutOfRange {
        position: usize,
        index: usize,
        options: usize,
    },

    #[error("model call failed: {0}")]
    Gateway(#[from] LlmError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl EvaluationError {
    /// True when the request itself is malformed, as opposed to a downstream failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            EvaluationError::NoQuestions | EvaluationError::CorrectIndexOutOfRange { .. }
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationRequest {
    pub domain: String,
    pub difficulty: String,
    pub questions: Vec<Question>,
    /// Submitted option indices; negative or out-of-range means "no answer".
    pub answers: Vec<i64>,
}

impl EvaluationRequest {
    pub fn validate(&self) -> Result<(), EvaluationError> {
        if self.questions.is_empty() {
            return Err(EvaluationError::NoQuestions);
        }
        check_answer_key(&self.questions)
    }
}

/// Fails on the first question whose correct index names no option.
pub fn check_answer_key(questions: &[Question]) -> Result<(), EvaluationError> {
    match questions
        .iter()
        .enumerate()
        .find(|(_, q)| q.correct_option().is_none())
    {
        Some((position, q)) => Err(EvaluationError::CorrectIndexOutOfRange {
            position,
            index: q.correct_option_index,
            options: q.options.len(),
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvaluationOptions {
    /// Max explanation calls in flight at once (at least 1).
    pub explanation_concurrency: usize,
    pub mode: ExtractionMode,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            explanation_concurrency: 4,
            mode: ExtractionMode::Lenient,
        }
    }
}

/// A wrong answer awaiting its explanation.
#[derive(Debug)]
pub struct Miss<'a> {
    pub question: &'a Question,
    pub user_answer_text: String,
    pub correct_answer_text: &'a str,
}

#[derive(Debug)]
pub struct Grading<'a> {
    pub score: usize,
    pub misses: Vec<Miss<'a>>,
}

fn is_correct(question: &Question, answer: i64) -> bool {
    usize::try_from(answer).is_ok_and(|a| a == question.correct_option_index)
}

/// Counts correct answers pairwise up to the shorter of the two lists.
pub fn count_correct(questions: &[Question], answers: &[i64]) -> usize {
    questions
        .iter()
        .zip(answers)
        .filter(|(q, &a)| is_correct(q, a))
        .count()
}

/// Compares answers to the key without calling the model.
pub fn grade<'a>(questions: &'a [Question], answers: &[i64]) -> Result<Grading<'a>, EvaluationError> {
    let mut score = 0;
    let mut misses = Vec::new();

    for (position, (question, &answer)) in questions.iter().zip(answers).enumerate() {
        if is_correct(question, answer) {
            score += 1;
            continue;
        }
        let correct_answer_text =
            question
                .correct_option()
                .ok_or(EvaluationError::CorrectIndexOutOfRange {
                    position,
                    index: question.correct_option_index,
                    options: question.options.len(),
                })?;
        misses.push(Miss {
            question,
            user_answer_text: question.option_at(answer).unwrap_or(NO_ANSWER).to_string(),
            correct_answer_text,
        });
    }

    Ok(Grading { score, misses })
}

pub fn percentage(score: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    score as f64 / total as f64 * 100.0
}

/// Rule-based feedback by percentage band.
pub fn detailed_feedback(percentage: f64, domain: &str) -> String {
    if percentage >= 80.0 {
        format!("Excellent performance! You have a strong understanding of {domain} concepts.")
    } else if percentage >= 60.0 {
        format!("Good work! You have a solid foundation in {domain} with room for improvement.")
    } else {
        format!("Keep practicing! Focus on strengthening your understanding of {domain} fundamentals.")
    }
}

pub async fn evaluate_answers(
    gateway: &dyn ModelGateway,
    request: &EvaluationRequest,
    options: &EvaluationOptions,
) -> Result<EvaluationReport, EvaluationError> {
    request.validate()?;

    let grading = grade(&request.questions, &request.answers)?;
    let total = request.questions.len();

    // The stream must own its futures for the handler future to stay Send.
    let pending: Vec<_> = grading
        .misses
        .iter()
        .map(|miss| explain_answer(gateway, &miss.question.text, miss.correct_answer_text))
        .collect();
    let explanations: Vec<String> = stream::iter(pending)
        .buffered(options.explanation_concurrency.max(1))
        .try_collect()
        .await?;

    let summary = ScoreSummary {
        domain: &request.domain,
        difficulty: &request.difficulty,
        score: grading.score,
        total,
        percentage: percentage(grading.score, total),
    };
    let feedback_prompt = build_feedback_prompt(&summary);
    let strengths_prompt = build_strengths_prompt(&summary);
    let improvements_prompt = build_improvements_prompt(&summary);

    let (narrative_feedback, strengths_raw, improvements_raw) = tokio::try_join!(
        gateway.generate(&feedback_prompt),
        gateway.generate(&strengths_prompt),
        gateway.generate(&improvements_prompt),
    )?;

    let strengths = extract_feedback_items(&strengths_raw);
    options
        .mode
        .check_count("strengths", FEEDBACK_LIST_COUNT, strengths.len())?;
    let improvements = extract_feedback_items(&improvements_raw);
    options
        .mode
        .check_count("improvements", FEEDBACK_LIST_COUNT, improvements.len())?;

    info!(
        "Evaluated {} assessment: score {}/{}, {} wrong answers explained",
        request.domain,
        grading.score,
        total,
        grading.misses.len()
    );

    let wrong_answers = grading
        .misses
        .into_iter()
        .zip(explanations)
        .map(|(miss, explanation_text)| WrongAnswerDetail {
            question_text: miss.question.text.clone(),
            user_answer_text: miss.user_answer_text,
            correct_answer_text: miss.correct_answer_text.to_string(),
            explanation_text,
        })
        .collect();

    Ok(EvaluationReport {
        score: grading.score,
        total_questions: total,
        narrative_feedback,
        detailed_feedback: detailed_feedback(summary.percentage, &request.domain),
        wrong_answers,
        strengths,
        improvements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedGateway;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const STRENGTHS: &str = "1. Quick recall of syntax\n2. Careful reading\n3. Solid fundamentals";
    const IMPROVEMENTS: &str = "- Practice lifetimes\n- Review traits\n- Study async";

    fn scripted() -> ScriptedGateway {
        ScriptedGateway::new()
            .reply("Explain why", "Because that is how it works.")
            .reply("Provide detailed feedback", "Solid effort overall.")
            .reply("specific strengths", STRENGTHS)
            .reply("specific areas for improvement", IMPROVEMENTS)
    }

    fn question(text: &str, options: &[&str], correct: usize) -> Question {
        Question {
            id: String::new(),
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_option_index: correct,
        }
    }

    fn request(questions: Vec<Question>, answers: Vec<i64>) -> EvaluationRequest {
        EvaluationRequest {
            domain: "Rust".to_string(),
            difficulty: "Beginner".to_string(),
            questions,
            answers,
        }
    }

    #[tokio::test]
    async fn test_all_correct_has_no_wrong_answers() {
        let gateway = scripted();
        let req = request(vec![question("Pick", &["x", "y"], 1)], vec![1]);

        let report = evaluate_answers(&gateway, &req, &EvaluationOptions::default())
            .await
            .unwrap();

        assert_eq!(report.score, 1);
        assert_eq!(report.total_questions, 1);
        assert!(report.wrong_answers.is_empty());
        assert_eq!(report.narrative_feedback, "Solid effort overall.");
        assert_eq!(report.strengths.len(), 3);
        assert_eq!(report.improvements, vec!["Practice lifetimes", "Review traits", "Study async"]);
        assert!(report.detailed_feedback.starts_with("Excellent performance!"));
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test]
    async fn test_wrong_answer_detail_names_both_options() {
        let gateway = scripted();
        let req = request(vec![question("Pick", &["x", "y"], 1)], vec![0]);

        let report = evaluate_answers(&gateway, &req, &EvaluationOptions::default())
            .await
            .unwrap();

        assert_eq!(report.score, 0);
        assert_eq!(
            report.wrong_answers,
            vec![WrongAnswerDetail {
                question_text: "Pick".to_string(),
                user_answer_text: "x".to_string(),
                correct_answer_text: "y".to_string(),
                explanation_text: "Because that is how it works.".to_string(),
            }]
        );
        assert!(report.detailed_feedback.starts_with("Keep practicing!"));
        // one explanation + three feedback calls
        assert_eq!(gateway.calls(), 4);
        assert!(gateway.prompts()[0].starts_with("Explain why 'y' is the correct answer to the question: 'Pick'"));
    }

    #[tokio::test]
    async fn test_out_of_range_submission_is_no_answer() {
        let gateway = scripted();
        let questions = vec![
            question("First", &["x", "y"], 1),
            question("Second", &["x", "y"], 0),
        ];
        let req = request(questions, vec![-1, 2]);

        let report = evaluate_answers(&gateway, &req, &EvaluationOptions::default())
            .await
            .unwrap();

        assert_eq!(report.wrong_answers.len(), 2);
        assert!(report
            .wrong_answers
            .iter()
            .all(|w| w.user_answer_text == NO_ANSWER));
    }

    #[tokio::test]
    async fn test_answers_beyond_question_count_are_ignored() {
        let gateway = scripted();
        let req = request(vec![question("Pick", &["x", "y"], 0)], vec![0, 1, 1]);

        let report = evaluate_answers(&gateway, &req, &EvaluationOptions::default())
            .await
            .unwrap();
        assert_eq!(report.score, 1);
        assert_eq!(report.total_questions, 1);
    }

    #[tokio::test]
    async fn test_unanswered_questions_are_not_wrong_answers() {
        let gateway = scripted();
        let questions = vec![
            question("One", &["a", "b"], 0),
            question("Two", &["a", "b"], 1),
        ];
        let req = request(questions, vec![0]);

        let report = evaluate_answers(&gateway, &req, &EvaluationOptions::default())
            .await
            .unwrap();
        assert_eq!(report.score, 1);
        assert_eq!(report.total_questions, 2);
        assert!(report.wrong_answers.is_empty());
        assert!(report.detailed_feedback.starts_with("Keep practicing!"));
    }

    #[tokio::test]
    async fn test_empty_question_list_fails_before_any_call() {
        let gateway = scripted();
        let err = evaluate_answers(&gateway, &request(vec![], vec![]), &EvaluationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, EvaluationError::NoQuestions));
        assert!(err.is_invalid_input());
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_bad_answer_key_fails_before_any_call() {
        let gateway = scripted();
        let req = request(
            vec![question("Fine", &["a"], 0), question("Broken", &["a", "b"], 3)],
            vec![0, 0],
        );

        let err = evaluate_answers(&gateway, &req, &EvaluationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EvaluationError::CorrectIndexOutOfRange {
                position: 1,
                index: 3,
                options: 2
            }
        ));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_explanation_aborts_whole_evaluation() {
        let gateway = ScriptedGateway::new()
            .fail("Explain why")
            .reply("Provide detailed feedback", "ok")
            .reply("specific strengths", STRENGTHS)
            .reply("specific areas for improvement", IMPROVEMENTS);
        let req = request(vec![question("Pick", &["x", "y"], 1)], vec![0]);

        let err = evaluate_answers(&gateway, &req, &EvaluationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, EvaluationError::Gateway(LlmError::EmptyContent)));
        assert!(!err.is_invalid_input());
    }

    #[tokio::test]
    async fn test_failed_feedback_call_aborts_whole_evaluation() {
        let gateway = ScriptedGateway::new()
            .reply("Provide detailed feedback", "ok")
            .reply("specific strengths", STRENGTHS)
            .fail("specific areas for improvement");
        let req = request(vec![question("Pick", &["x", "y"], 1)], vec![1]);

        let result = evaluate_answers(&gateway, &req, &EvaluationOptions::default()).await;
        assert!(matches!(result, Err(EvaluationError::Gateway(_))));
    }

    #[tokio::test]
    async fn test_strict_mode_enforces_feedback_list_counts() {
        let gateway = ScriptedGateway::new()
            .reply("Provide detailed feedback", "ok")
            .reply("specific strengths", "1. Only one strength here")
            .reply("specific areas for improvement", IMPROVEMENTS);
        let req = request(vec![question("Pick", &["x", "y"], 1)], vec![1]);

        let lenient = evaluate_answers(&gateway, &req, &EvaluationOptions::default())
            .await
            .unwrap();
        assert_eq!(lenient.strengths, vec!["Only one strength here"]);

        let strict = EvaluationOptions {
            mode: ExtractionMode::Strict,
            ..EvaluationOptions::default()
        };
        let err = evaluate_answers(&gateway, &req, &strict).await.unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Extraction(ExtractionError::CountMismatch {
                what: "strengths",
                expected: 3,
                actual: 1
            })
        ));
    }

    /// Echoes explanation prompts back after a delay that shrinks with position,
    /// so completion order is the reverse of question order.
    struct SlowEchoGateway {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl ModelGateway for SlowEchoGateway {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            if !prompt.starts_with("Explain why") {
                return Ok("1. Consistent effort shown".to_string());
            }
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = if prompt.contains("Q0") { 40 } else if prompt.contains("Q1") { 20 } else { 5 };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(prompt.to_string())
        }
    }

    #[tokio::test]
    async fn test_explanations_keep_question_order_and_respect_concurrency() {
        let gateway = SlowEchoGateway {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        };
        let questions: Vec<_> = (0..5)
            .map(|i| question(&format!("Q{i}"), &["a", "b"], 1))
            .collect();
        let req = request(questions, vec![0; 5]);
        let options = EvaluationOptions {
            explanation_concurrency: 2,
            mode: ExtractionMode::Lenient,
        };

        let report = evaluate_answers(&gateway, &req, &options).await.unwrap();

        assert_eq!(report.wrong_answers.len(), 5);
        for (i, wrong) in report.wrong_answers.iter().enumerate() {
            assert_eq!(wrong.question_text, format!("Q{i}"));
            assert!(wrong.explanation_text.contains(&format!("question: 'Q{i}'")));
        }
        assert!(gateway.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_count_correct_stops_at_shorter_list() {
        let questions = vec![question("a", &["x", "y"], 1), question("b", &["x", "y"], 0)];
        assert_eq!(count_correct(&questions, &[1, 0]), 2);
        assert_eq!(count_correct(&questions, &[1]), 1);
        assert_eq!(count_correct(&questions, &[-1, 0, 0]), 1);
        assert_eq!(count_correct(&[], &[0]), 0);
    }

    #[test]
    fn test_percentage_handles_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert!((percentage(2, 3) - 66.666_666).abs() < 0.001);
    }

    #[test]
    fn test_detailed_feedback_bands() {
        assert!(detailed_feedback(100.0, "SQL").contains("strong understanding of SQL concepts"));
        assert!(detailed_feedback(80.0, "SQL").starts_with("Excellent performance!"));
        assert!(detailed_feedback(79.9, "SQL").starts_with("Good work!"));
        assert!(detailed_feedback(60.0, "SQL").contains("solid foundation in SQL"));
        assert!(detailed_feedback(59.9, "SQL").starts_with("Keep practicing!"));
        assert!(detailed_feedback(0.0, "SQL").contains("SQL fundamentals"));
    }

    #[test]
    fn test_grade_collects_misses_in_order() {
        let questions = vec![
            question("a", &["x", "y"], 1),
            question("b", &["x", "y"], 0),
            question("c", &["x", "y"], 0),
        ];
        let grading = grade(&questions, &[0, 0, 7]).unwrap();
        assert_eq!(grading.score, 1);
        let texts: Vec<_> = grading.misses.iter().map(|m| m.question.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
        assert_eq!(grading.misses[1].user_answer_text, NO_ANSWER);
        assert_eq!(grading.misses[1].correct_answer_text, "x");
    }
}
