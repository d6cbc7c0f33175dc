//! Grading of learner answers.
//!
//! Grading is pure: the returned [`QuizResponse`] is what the caller feeds
//! into `StudentModel::update_mastery`. Nothing here touches learner state.

use crate::tutoring_engine::{
    config::QuizConfig,
    error::Result,
    generator::{QuestionTextGenerator, QuizGenerator},
    helpers::normalize_answer,
    models::{check_unit_interval, NextAction, Question, QuizResponse},
};

const NUMERIC_TOLERANCE: f64 = 1e-9;

/// Case- and format-insensitive comparison; numeric answers compare by value.
pub fn answers_match(expected: &str, given: &str) -> bool {
    let expected = normalize_answer(expected);
    let given = normalize_answer(given);
    if expected == given {
        return true;
    }
    match (expected.parse::<f64>(), given.parse::<f64>()) {
        (Ok(a), Ok(b)) => (a - b).abs() <= NUMERIC_TOLERANCE * a.abs().max(1.0),
        _ => false,
    }
}

/// Grade `student_answer` against `question`, using `mastery` as the learner's
/// current estimate when choosing the next action.
pub fn evaluate_answer(
    question: &Question,
    student_answer: &str,
    confidence: f64,
    mastery: f64,
    config: &QuizConfig,
) -> Result<QuizResponse> {
    let confidence = check_unit_interval("confidence", confidence)?;
    let mastery = check_unit_interval("mastery", mastery)?;
    let is_correct = answers_match(&question.canonical_answer, student_answer);
    let confident = confidence >= config.high_confidence;

    let next_action = if !is_correct {
        NextAction::ReviewTopic
    } else if confident && mastery > config.hard_above {
        NextAction::IncreaseDifficulty
    } else {
        NextAction::Continue
    };

    Ok(QuizResponse {
        question_id: question.question_id.clone(),
        topic: question.topic.clone(),
        student_answer: student_answer.to_string(),
        is_correct,
        feedback: feedback(question, is_correct, confident),
        bloom_level: question.bloom_level,
        next_action,
        confidence,
    })
}

fn feedback(question: &Question, is_correct: bool, confident: bool) -> String {
    let topic = &question.topic;
    match (is_correct, confident) {
        (true, true) => format!(
            "Correct. That is a solid {}-level answer on {topic}.",
            question.bloom_level
        ),
        (true, false) => format!(
            "Correct, though you were unsure. One more pass over {topic} will make it stick."
        ),
        (false, true) => format!(
            "Not quite: the expected answer is \"{}\". You answered with confidence, so re-read the {topic} material before moving on.",
            question.canonical_answer
        ),
        (false, false) => format!(
            "Not quite: the expected answer is \"{}\". Review {topic} and try a similar question.",
            question.canonical_answer
        ),
    }
}

impl<G: QuestionTextGenerator> QuizGenerator<G> {
    /// Grade using the mastery the question was generated for.
    pub fn evaluate_answer(&self, question: &Question, student_answer: &str, confidence: f64) -> Result<QuizResponse> {
        evaluate_answer(question, student_answer, confidence, question.mastery_snapshot, self.config())
    }

    /// Grade using a fresh mastery estimate.
    pub fn evaluate_answer_with_mastery(
        &self,
        question: &Question,
        student_answer: &str,
        confidence: f64,
        mastery: f64,
    ) -> Result<QuizResponse> {
        evaluate_answer(question, student_answer, confidence, mastery, self.config())
    }
}
