use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::tutoring_engine::error::{Result, TutorError};

// ---------------------------------------------------------------------------
// Topic reference data
// ---------------------------------------------------------------------------

/// Identifier of a course topic, e.g. `"graph_search/bfs"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(pub String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Self {
        TopicId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicId {
    fn from(s: &str) -> Self {
        TopicId(s.to_string())
    }
}

impl From<String> for TopicId {
    fn from(s: String) -> Self {
        TopicId(s)
    }
}

/// Externally supplied, immutable topic definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub prerequisites: BTreeSet<TopicId>,
    pub default_difficulty: Difficulty,
}

impl Topic {
    pub fn new(id: impl Into<TopicId>, prerequisites: &[&str], default_difficulty: Difficulty) -> Self {
        Topic {
            id: id.into(),
            prerequisites: prerequisites.iter().map(|p| TopicId::from(*p)).collect(),
            default_difficulty,
        }
    }
}

/// Learner's mastery per topic, as consumed by the quiz generator and planner.
pub type MasteryMap = BTreeMap<TopicId, f64>;

/// Fail with a validation error unless `value` is a finite number in [0, 1].
pub fn check_unit_interval(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(TutorError::Validation(format!("{what} must be within [0, 1], got {value}")))
    }
}

// ---------------------------------------------------------------------------
// Learner state records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub topic: TopicId,
    /// Stored mastery probability in [0, 1], before any forgetting is applied.
    pub mastery: f64,
    /// Days until the stored mastery decays to ~50%.
    pub strength_days: f64,
    pub practice_count: u32,
    /// `None` until the first recorded interaction; decay is gated on this.
    pub last_interaction: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub topic: TopicId,
    pub correct: bool,
    pub hint_used: bool,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misconception {
    /// Registry identifier, e.g. `"traversal_direction"`.
    pub kind: String,
    pub topic: TopicId,
    pub detection_count: u32,
    /// Correct answers in a row since the pattern was last seen.
    pub clean_streak: u32,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub topic: TopicId,
    pub next_review_date: NaiveDate,
    pub interval_days: u32,
    /// Mastery the interval was chosen for; an interval only shrinks when
    /// mastery falls below this.
    pub mastery_at_schedule: f64,
}

// ---------------------------------------------------------------------------
// Difficulty and cognitive level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy   => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard   => write!(f, "hard"),
        }
    }
}

impl Difficulty {
    /// Bloom levels a question of this difficulty may target, lowest first.
    pub fn bloom_band(self) -> &'static [BloomLevel] {
        match self {
            Difficulty::Easy   => &[BloomLevel::Remember, BloomLevel::Understand],
            Difficulty::Medium => &[BloomLevel::Apply],
            Difficulty::Hard   => &[BloomLevel::Analyze, BloomLevel::Evaluate],
        }
    }

    /// True if `level` is aligned with this difficulty.
    pub fn admits(self, level: BloomLevel) -> bool {
        self.bloom_band().contains(&level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloomLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
}

impl fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BloomLevel::Remember   => "remember",
            BloomLevel::Understand => "understand",
            BloomLevel::Apply      => "apply",
            BloomLevel::Analyze    => "analyze",
            BloomLevel::Evaluate   => "evaluate",
        };
        write!(f, "{}", s)
    }
}

// ---------------------------------------------------------------------------
// Quiz request / response types
// ---------------------------------------------------------------------------

/// What the text generator is asked to write about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub topic: TopicId,
    pub difficulty: Difficulty,
    pub bloom_level: BloomLevel,
}

/// Untrusted output of the text generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub prompt_text: String,
    pub canonical_answer: String,
    #[serde(default)]
    pub distractors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    Generated,
    Bank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: String,
    pub topic: TopicId,
    pub difficulty: Difficulty,
    pub bloom_level: BloomLevel,
    pub prompt: String,
    pub canonical_answer: String,
    pub distractors: Vec<String>,
    pub source: QuestionSource,
    /// Mastery estimate the difficulty was chosen from.
    pub mastery_snapshot: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    ReviewTopic,
    IncreaseDifficulty,
    Continue,
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextAction::ReviewTopic        => write!(f, "review_topic"),
            NextAction::IncreaseDifficulty => write!(f, "increase_difficulty"),
            NextAction::Continue           => write!(f, "continue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResponse {
    pub question_id: String,
    pub topic: TopicId,
    pub student_answer: String,
    pub is_correct: bool,
    pub feedback: String,
    pub bloom_level: BloomLevel,
    pub next_action: NextAction,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Study plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    NewLearning,
    Review,
    Practice,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::NewLearning => write!(f, "new learning"),
            ActivityKind::Review      => write!(f, "review"),
            ActivityKind::Practice    => write!(f, "practice"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub topic: TopicId,
    pub activity: ActivityKind,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// 1-based day index.
    pub day: u32,
    pub sessions: Vec<StudySession>,
}

impl DayPlan {
    pub fn total_hours(&self) -> f64 {
        self.sessions.iter().map(|s| s.hours).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    pub days: Vec<DayPlan>,
}

impl WeekPlan {
    pub fn total_hours(&self) -> f64 {
        self.days.iter().map(DayPlan::total_hours).sum()
    }

    pub fn hours_for(&self, kind: ActivityKind) -> f64 {
        self.sessions().filter(|s| s.activity == kind).map(|s| s.hours).sum()
    }

    /// Realised fraction of the week spent on `kind`; 0 for an empty plan.
    pub fn share(&self, kind: ActivityKind) -> f64 {
        let total = self.total_hours();
        if total <= 0.0 {
            return 0.0;
        }
        self.hours_for(kind) / total
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|d| d.sessions.is_empty())
    }

    pub fn sessions(&self) -> impl Iterator<Item = &StudySession> {
        self.days.iter().flat_map(|d| d.sessions.iter())
    }
}
