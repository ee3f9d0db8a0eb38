//! Response Extractor. Turns free-form model text into roadmap steps,
//! feedback list items, and multiple-choice questions.
//!
//! All modes share one primitive: split into lines, trim, drop empty lines.
//! The question labels are defined in `prompts`; the scanner recognises
//! exactly the format those prompts ask for.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::tutor::models::Question;
use crate::tutor::prompts::{CORRECT_ANSWER_LABEL, OPTION_LETTERS, QUESTION_LABEL};

/// Roadmap steps must be longer than this many characters.
pub const ROADMAP_MIN_CHARS: usize = 10;
/// Strength / improvement items must be longer than this many characters.
pub const LIST_ITEM_MIN_CHARS: usize = 5;

static NUMBERED_PREFIX: Lazy<Regex> = Lazy::new(|| compile(r"^\d+\.\s*"));
static BULLET_PREFIX: Lazy<Regex> = Lazy::new(|| compile(r"^[•-]\s*"));
static STAR_PREFIX: Lazy<Regex> = Lazy::new(|| compile(r"^\*\s*"));

static QUESTION_HEADER: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"^{} \d+:\s*", regex::escape(QUESTION_LABEL))));
static OPTION_LINE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"^[{}]\)\s*", option_letter_class())));
static CORRECT_ANSWER_LINE: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"^{}\s*([{}])$",
        regex::escape(CORRECT_ANSWER_LABEL),
        option_letter_class()
    ))
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid extractor pattern {pattern:?}: {e}"))
}

fn option_letter_class() -> String {
    OPTION_LETTERS.iter().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("AI did not generate valid {what}")]
    Empty { what: &'static str },

    #[error("expected exactly {expected} {what}, model returned {actual}")]
    CountMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("question {id} marks option {index} correct but has {options} options")]
    CorrectIndexOutOfRange {
        id: String,
        index: usize,
        options: usize,
    },
}

/// How strictly extracted output is held to the counts the prompt asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Accept whatever parsed.
    #[default]
    Lenient,
    /// Reject output whose item count differs from the requested count.
    Strict,
}

impl FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("expected 'lenient' or 'strict', got '{other}'")),
        }
    }
}

impl ExtractionMode {
    pub fn check_count(
        self,
        what: &'static str,
        expected: usize,
        actual: usize,
    ) -> Result<(), ExtractionError> {
        if self == Self::Strict && actual != expected {
            return Err(ExtractionError::CountMismatch {
                what,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// In strict mode every question's correct index must name one of its options.
    pub fn check_questions(self, questions: &[Question]) -> Result<(), ExtractionError> {
        if self == Self::Lenient {
            return Ok(());
        }
        match questions
            .iter()
            .find(|q| q.correct_option_index >= q.options.len())
        {
            Some(q) => Err(ExtractionError::CorrectIndexOutOfRange {
                id: q.id.clone(),
                index: q.correct_option_index,
                options: q.options.len(),
            }),
            None => Ok(()),
        }
    }
}

pub fn require_non_empty<T>(what: &'static str, items: &[T]) -> Result<(), ExtractionError> {
    if items.is_empty() {
        return Err(ExtractionError::Empty { what });
    }
    Ok(())
}

fn content_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines().map(str::trim).filter(|line| !line.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// List-item mode
// ────────────────────────────────────────────────────────────────────────────

/// Strips one list marker: a `N.` number, else a `•`/`-` bullet, else a `*`.
fn strip_list_marker(line: &str) -> &str {
    [&*NUMBERED_PREFIX, &*BULLET_PREFIX, &*STAR_PREFIX]
        .into_iter()
        .find_map(|re| re.find(line))
        .map_or(line, |m| &line[m.end()..])
}

/// Extracts list items in input order, keeping those longer than `min_chars`.
/// No dedup and no cap on count.
pub fn extract_list_items(raw: &str, min_chars: usize) -> Vec<String> {
    content_lines(raw)
        .map(strip_list_marker)
        .filter(|item| item.chars().count() > min_chars)
        .map(str::to_string)
        .collect()
}

pub fn extract_roadmap_steps(raw: &str) -> Vec<String> {
    extract_list_items(raw, ROADMAP_MIN_CHARS)
}

pub fn extract_feedback_items(raw: &str) -> Vec<String> {
    extract_list_items(raw, LIST_ITEM_MIN_CHARS)
}

// ────────────────────────────────────────────────────────────────────────────
// Question mode
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Line<'a> {
    QuestionStart(&'a str),
    Option(&'a str),
    CorrectAnswer(usize),
    Other,
}

fn classify(line: &str) -> Line<'_> {
    let is_option = OPTION_LINE.is_match(line);

    if QUESTION_HEADER.is_match(line) || (line.contains('?') && !is_option) {
        let text = QUESTION_HEADER
            .find(line)
            .map_or(line, |m| &line[m.end()..]);
        return Line::QuestionStart(text);
    }

    if let Some(m) = OPTION_LINE.find(line) {
        return Line::Option(&line[m.end()..]);
    }

    let correct = CORRECT_ANSWER_LINE
        .captures(line)
        .and_then(|caps| caps[1].chars().next())
        .and_then(|letter| OPTION_LETTERS.iter().position(|&l| l == letter));
    match correct {
        Some(index) => Line::CorrectAnswer(index),
        None => Line::Other,
    }
}

#[derive(Debug)]
struct PendingQuestion {
    text: String,
    options: Vec<String>,
    correct_option_index: usize,
}

#[derive(Debug)]
enum ScanState {
    NoCurrentQuestion,
    AccumulatingQuestion(PendingQuestion),
}

impl ScanState {
    fn step(self, line: Line<'_>, out: &mut Vec<Question>) -> ScanState {
        match (self, line) {
            (state, Line::QuestionStart(text)) => {
                state.finish(out);
                ScanState::AccumulatingQuestion(PendingQuestion {
                    text: text.to_string(),
                    options: Vec::new(),
                    correct_option_index: 0,
                })
            }
            (ScanState::AccumulatingQuestion(mut q), Line::Option(option)) => {
                q.options.push(option.to_string());
                ScanState::AccumulatingQuestion(q)
            }
            (ScanState::AccumulatingQuestion(mut q), Line::CorrectAnswer(index)) => {
                q.correct_option_index = index;
                ScanState::AccumulatingQuestion(q)
            }
            // Options and answers before the first question, and unrecognised lines.
            (state, _) => state,
        }
    }

    /// Emits the pending question if it collected at least one option.
    fn finish(self, out: &mut Vec<Question>) {
        let ScanState::AccumulatingQuestion(q) = self else {
            return;
        };
        if q.options.is_empty() {
            debug!("Dropping question without options: {:?}", q.text);
            return;
        }
        out.push(Question {
            id: format!("q{}", out.len()),
            text: q.text,
            options: q.options,
            correct_option_index: q.correct_option_index,
        });
    }
}

/// Scans `Question N:` / `A)`..`D)` / `Correct Answer: X` blocks.
///
/// Questions that end with no options are dropped. Ids are `q<position>`
/// in the returned list.
pub fn extract_questions(raw: &str) -> Vec<Question> {
    let mut questions = Vec::new();
    let state = content_lines(raw).fold(ScanState::NoCurrentQuestion, |state, line| {
        state.step(classify(line), &mut questions)
    });
    state.finish(&mut questions);
    questions
}
