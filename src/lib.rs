//! # tutor_core
//!
//! The logic layer of an intelligent tutor: what a learner knows, what to ask
//! them next, and how to spend their study time.
//!
//! The crate has no I/O and no hidden state. Each learner's knowledge lives in
//! a [`StudentState`] value that the caller owns, passes into the engines, and
//! persists through [`snapshot`] however it likes.
//!
//! ## How it works
//!
//! 1. [`StudentModel`] reads and updates a [`StudentState`]: mastery with
//!    forgetting, misconception tracking, and a tiered review schedule.
//! 2. [`QuizGenerator`] turns the current mastery estimate into a difficulty
//!    and Bloom level, asks an external [`QuestionTextGenerator`] for the
//!    prose, validates it, and grades answers into a [`QuizResponse`].
//! 3. The caller feeds each [`QuizResponse`] back into
//!    [`StudentModel::update_mastery`]. The quiz side never mutates learner
//!    state itself.
//! 4. [`StudyPlanner`] orders topics by prerequisites and splits study time
//!    for exam prep or a balanced week.
//!
//! ## Key features
//!
//! - **Explicit time**: every time-dependent call takes `now`, so results are
//!   reproducible in tests.
//! - **Deterministic quizzes**: `QuizRequest::seeded` fixes question ids and
//!   bank picks.
//! - **Typed failures**: [`TutorError`] separates validation, structural
//!   (prerequisite cycle) and generator failures.
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::Utc;
//! use tutor_core::{
//!     GeneratedContent, PromptRequest, QuizConfig, QuizGenerator, StudentModel, StudentState, TopicId,
//! };
//!
//! let model = StudentModel::default();
//! let mut state = StudentState::new("learner-1");
//! let bfs = TopicId::from("bfs");
//!
//! let writer = |req: &PromptRequest| -> Result<GeneratedContent, String> {
//!     Ok(GeneratedContent {
//!         prompt_text: format!("({}) Which structure holds the BFS frontier?", req.bloom_level),
//!         canonical_answer: "queue".into(),
//!         distractors: vec!["stack".into()],
//!     })
//! };
//! let mut quiz = QuizGenerator::new(writer, QuizConfig::default());
//!
//! let now = Utc::now();
//! let questions = quiz.quiz_for(&model, &state, &bfs, 1, now).unwrap();
//! let response = quiz.evaluate_answer(&questions[0], "Queue", 0.8).unwrap();
//! assert!(response.is_correct);
//!
//! let mastery = model
//!     .update_mastery(&mut state, &bfs, response.is_correct, false, response.confidence, now)
//!     .unwrap();
//! assert!(mastery > 0.2);
//! ```

pub mod snapshot;
pub mod tutoring_engine;

// Convenience re-exports so callers can use `tutor_core::StudentModel`
// directly without reaching into `tutoring_engine::`.
pub use snapshot::{LearnerStore, MemoryStore, Snapshot, SNAPSHOT_VERSION};
pub use tutoring_engine::{
    optimize_topic_order, ActivityKind, BloomLevel, DayPlan, Difficulty, GeneratedContent,
    LearnerSummary, MasteryMap, NextAction, PrerequisiteGraph, PromptRequest, Question, QuestionBank,
    QuestionSource, QuestionTextGenerator, QuizConfig, QuizGenerator, QuizRequest, QuizResponse,
    Result, StudentModel, StudentState, StudyPlanner, StudySession, Topic, TopicId, TutorConfig,
    TutorError, WeekPlan,
};

#[cfg(test)]
mod tests;
