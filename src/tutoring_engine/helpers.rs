//! Shared builder functions used by the quiz generator and the question bank.
//!
//! Both question sources end in the same shape: an id derived from the RNG,
//! trimmed text, and a [`Question`] carrying topic, difficulty and Bloom level.
//! These helpers keep that assembly in one place.

use rand::RngCore;

use crate::tutoring_engine::models::{
    BloomLevel, Difficulty, GeneratedContent, PromptRequest, Question, QuestionSource, TopicId,
};

/// Question id of the form `Q-<topic>-<8 hex digits>`.
pub fn question_id(topic: &TopicId, rng: &mut impl RngCore) -> String {
    let slug: String = topic
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("Q-{}-{:08X}", slug, rng.next_u32())
}

/// Lowercase, trim, drop wrapping quotes/parens and trailing punctuation, and
/// collapse inner whitespace, so "  (B). " and "b" compare equal.
pub fn normalize_answer(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let s = lowered.strip_prefix("answer:").unwrap_or(&lowered).trim();
    let s = s.trim_end_matches(&['.', '!', ';'][..]).trim();
    let s = strip_wrapping(s, '"', '"');
    let s = strip_wrapping(s, '\'', '\'');
    let s = strip_wrapping(s, '`', '`');
    let s = strip_wrapping(s, '(', ')');
    let s = s.strip_suffix(')').filter(|inner| inner.len() == 1).unwrap_or(s);
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_wrapping(s: &str, open: char, close: char) -> &str {
    s.strip_prefix(open)
        .and_then(|inner| inner.strip_suffix(close))
        .map(str::trim)
        .unwrap_or(s)
}

/// Reject generator output that could not be shown to a learner.
pub fn validate_content(content: &GeneratedContent) -> Result<(), String> {
    if content.prompt_text.trim().is_empty() {
        return Err("empty prompt text".to_string());
    }
    let canonical = normalize_answer(&content.canonical_answer);
    if canonical.is_empty() {
        return Err("missing canonical answer".to_string());
    }
    for distractor in &content.distractors {
        let d = normalize_answer(distractor);
        if d.is_empty() {
            return Err("empty distractor".to_string());
        }
        if d == canonical {
            return Err(format!("distractor {distractor:?} repeats the canonical answer"));
        }
    }
    Ok(())
}

/// Assemble a [`Question`] from validated content.
pub fn question(
    id: String,
    request: &PromptRequest,
    content: GeneratedContent,
    source: QuestionSource,
    mastery_snapshot: f64,
) -> Question {
    Question {
        question_id: id,
        topic: request.topic.clone(),
        difficulty: request.difficulty,
        bloom_level: request.bloom_level,
        prompt: content.prompt_text.trim().to_string(),
        canonical_answer: content.canonical_answer.trim().to_string(),
        distractors: content.distractors.iter().map(|d| d.trim().to_string()).collect(),
        source,
        mastery_snapshot,
    }
}

/// The `index`-th Bloom level of a difficulty band, cycling through the band.
pub fn bloom_for_slot(difficulty: Difficulty, index: usize) -> BloomLevel {
    let band = difficulty.bloom_band();
    band[index % band.len()]
}
