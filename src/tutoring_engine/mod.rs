//! Core tutoring engine: learner model, quiz selection, and study planning.
//!
//! ## Module overview
//!
//! | Module           | Purpose |
//! |------------------|---------|
//! | `models`         | Shared types: topics, mastery records, questions, plans |
//! | `config`         | Tunable thresholds with serde defaults |
//! | `error`          | `TutorError` and the crate `Result` alias |
//! | `state`          | `StudentState`, the caller-owned per-learner value |
//! | `student_model`  | Mastery decay and updates, misconceptions, review scheduling |
//! | `misconceptions` | Registry of known error patterns per topic |
//! | `generator`      | Difficulty/Bloom selection and `QuizGenerator` with retry and fallback |
//! | `bank`           | Pre-authored questions used when generation fails |
//! | `evaluator`      | Answer grading and next-action choice |
//! | `helpers`        | Question ids, answer normalization, content checks |
//! | `topo_order`     | `PrerequisiteGraph` and Kahn ordering |
//! | `planner`        | Exam-prep and weekly plans |

pub mod bank;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod helpers;
pub mod misconceptions;
pub mod models;
pub mod planner;
pub mod state;
pub mod student_model;
pub mod topo_order;

pub use bank::{BankQuestion, QuestionBank};
pub use config::{
    MasteryConfig, MisconceptionConfig, PlannerConfig, QuizConfig, ReviewConfig, ReviewTier, TutorConfig,
};
pub use error::{Result, TutorError};
pub use evaluator::{answers_match, evaluate_answer};
pub use generator::{
    bloom_level_for_difficulty, recommend_difficulty, QuestionTextGenerator, QuizGenerator, QuizRequest,
};
pub use misconceptions::{MisconceptionRegistry, MisconceptionSignature};
pub use models::{
    ActivityKind, BloomLevel, DayPlan, Difficulty, GeneratedContent, InteractionEvent, MasteryMap,
    MasteryRecord, Misconception, NextAction, PromptRequest, Question, QuestionSource, QuizResponse,
    ReviewEntry, StudySession, Topic, TopicId, WeekPlan,
};
pub use planner::StudyPlanner;
pub use state::StudentState;
pub use student_model::{LearnerSummary, StudentModel};
pub use topo_order::{optimize_topic_order, order_topics_by, PrerequisiteGraph};
