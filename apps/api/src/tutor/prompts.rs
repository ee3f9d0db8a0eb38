// All LLM prompt templates for the tutor module.
//
// The output-format markers below are a contract with `extractor`: the
// question scanner recognises exactly these labels. Change both together.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Label that opens each question block, followed by ` <n>:`.
pub const QUESTION_LABEL: &str = "Question";
/// Label of the line naming the correct option letter.
pub const CORRECT_ANSWER_LABEL: &str = "Correct Answer:";
/// Option letters in order; index in this slice is the option index.
pub const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Number of steps a roadmap prompt asks for.
pub const ROADMAP_STEP_COUNT: usize = 10;
/// Number of strengths / improvement areas an evaluation asks for.
pub const FEEDBACK_LIST_COUNT: usize = 3;

/// Replace: {domain}, {difficulty}, {timeframe}, {step_count}
pub const ROADMAP_PROMPT_TEMPLATE: &str = "Create a detailed learning roadmap for {domain} \
    with {difficulty} difficulty level to be completed in {timeframe}. \
    Provide exactly {step_count} specific, actionable steps that progressively build knowledge and skills. \
    Each step should be clear, practical, and include specific topics or technologies to learn. \
    Format as a numbered list with detailed descriptions for each step, one step per line. \
    Make it comprehensive and tailored to the difficulty level.";

/// Replace: {count}, {domain}, {difficulty}, {format_block}
pub const ASSESSMENT_PROMPT_TEMPLATE: &str = r#"Generate exactly {count} multiple choice questions about {domain} at {difficulty} difficulty level.
For each question, provide:
1. A clear, specific question about {domain} concepts
2. Exactly four answer options labeled A, B, C, D
3. Indicate which option (A, B, C, or D) is correct
4. Make questions practical and test real understanding
5. Ensure questions are appropriate for {difficulty} difficulty level

Format your response as follows for each question, each item on its own line:
{format_block}

Please generate all {count} questions in this exact format."#;

/// Replace: {correct_answer}, {question}
pub const EXPLANATION_PROMPT_TEMPLATE: &str = "Explain why '{correct_answer}' is the correct answer \
    to the question: '{question}'. \
    Provide a detailed explanation that helps the student understand the concept. \
    Include key points, reasoning, and any relevant background information. \
    Make it educational and easy to understand. \
    Provide at least 3-4 sentences of explanation.";

/// Replace: {score}, {total}, {difficulty}, {domain}, {percentage}
pub const FEEDBACK_PROMPT_TEMPLATE: &str = "Provide detailed feedback for a student who scored \
    {score} out of {total} on a {difficulty} difficulty {domain} assessment. \
    The student got {percentage}% correct. \
    Provide: \
    1. Overall performance assessment \
    2. What this score indicates about their understanding \
    3. Specific recommendations for improvement \
    4. Encouragement and next steps \
    Be constructive, specific, and encouraging. Write 4-5 sentences.";

/// Replace: {score}, {total}, {percentage}, {difficulty}, {domain}, {count}
pub const STRENGTHS_PROMPT_TEMPLATE: &str = "Based on a score of {score} out of {total} \
    ({percentage}%) on a {difficulty} {domain} assessment, \
    list {count} specific strengths this student has demonstrated. \
    Format as a simple list, one strength per line.";

/// Replace: {score}, {total}, {percentage}, {difficulty}, {domain}, {count}
pub const IMPROVEMENTS_PROMPT_TEMPLATE: &str = "Based on a score of {score} out of {total} \
    ({percentage}%) on a {difficulty} {domain} assessment, \
    list {count} specific areas for improvement. \
    Format as a simple list, one improvement area per line.";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(\w+)\}").unwrap_or_else(|e| panic!("invalid placeholder pattern: {e}"))
});

/// Score figures shared by the three evaluation feedback prompts.
#[derive(Debug, Clone, Copy)]
pub struct ScoreSummary<'a> {
    pub domain: &'a str,
    pub difficulty: &'a str,
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
}

pub fn build_roadmap_prompt(domain: &str, timeframe: &str, difficulty: &str) -> String {
    let difficulty = difficulty.to_lowercase();
    let step_count = ROADMAP_STEP_COUNT.to_string();
    fill(
        ROADMAP_PROMPT_TEMPLATE,
        &[
            ("domain", domain),
            ("difficulty", &difficulty),
            ("timeframe", timeframe),
            ("step_count", &step_count),
        ],
    )
}

pub fn build_assessment_prompt(domain: &str, difficulty: &str, count: u32) -> String {
    let difficulty = difficulty.to_lowercase();
    let count = count.to_string();
    let format_block = question_format_block();
    fill(
        ASSESSMENT_PROMPT_TEMPLATE,
        &[
            ("format_block", &format_block),
            ("count", &count),
            ("domain", domain),
            ("difficulty", &difficulty),
        ],
    )
}

pub fn build_explanation_prompt(question: &str, correct_answer: &str) -> String {
    fill(
        EXPLANATION_PROMPT_TEMPLATE,
        &[("correct_answer", correct_answer), ("question", question)],
    )
}

pub fn build_feedback_prompt(summary: &ScoreSummary<'_>) -> String {
    fill_score_template(FEEDBACK_PROMPT_TEMPLATE, summary)
}

pub fn build_strengths_prompt(summary: &ScoreSummary<'_>) -> String {
    fill_score_template(STRENGTHS_PROMPT_TEMPLATE, summary)
}

pub fn build_improvements_prompt(summary: &ScoreSummary<'_>) -> String {
    fill_score_template(IMPROVEMENTS_PROMPT_TEMPLATE, summary)
}

fn fill_score_template(template: &str, summary: &ScoreSummary<'_>) -> String {
    let score = summary.score.to_string();
    let total = summary.total.to_string();
    let percentage = format!("{:.1}", summary.percentage);
    let difficulty = summary.difficulty.to_lowercase();
    let count = FEEDBACK_LIST_COUNT.to_string();
    fill(
        template,
        &[
            ("score", &score),
            ("total", &total),
            ("percentage", &percentage),
            ("difficulty", &difficulty),
            ("domain", summary.domain),
            ("count", &count),
        ],
    )
}

/// Substitutes `{name}` placeholders in one pass over the template, so
/// braces inside substituted values are never expanded. Unknown names are
/// left as written.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

/// The per-question block the model must echo, built from the contract markers.
fn question_format_block() -> String {
    let mut lines = vec![format!("{QUESTION_LABEL} X: [question text]")];
    lines.extend(
        OPTION_LETTERS
            .iter()
            .map(|letter| format!("{letter}) [option {letter}]")),
    );
    lines.push(format!("{CORRECT_ANSWER_LABEL} [A/B/C/D]"));
    lines.join("\n")
}
