//! Tuning constants for the tutoring engine.
//!
//! Every number here is a pedagogical default rather than a derived value, so
//! all of them are exposed for the host application to override. Partial JSON
//! is accepted: missing fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::tutoring_engine::error::{Result, TutorError};
use crate::tutoring_engine::models::check_unit_interval;

const SHARE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    pub mastery: MasteryConfig,
    pub review: ReviewConfig,
    pub misconception: MisconceptionConfig,
    pub quiz: QuizConfig,
    pub planner: PlannerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasteryConfig {
    /// Mastery assumed for a topic on first reference.
    pub prior: f64,
    /// Fraction of the gap to the target (1 or 0) closed by one answer.
    pub learning_rate: f64,
    /// Multiplier on the gain of a correct answer given with a hint.
    pub hint_factor: f64,
    pub default_strength_days: f64,
    pub strength_growth: f64,
    pub max_strength_days: f64,
    pub struggling_threshold: f64,
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            prior: 0.2,
            learning_rate: 0.3,
            hint_factor: 0.5,
            default_strength_days: 7.0,
            strength_growth: 1.25,
            max_strength_days: 180.0,
            struggling_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewTier {
    pub min_mastery: f64,
    pub interval_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Sorted by `min_mastery`; the first tier must start at 0.
    pub tiers: Vec<ReviewTier>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                ReviewTier { min_mastery: 0.0, interval_days: 1 },
                ReviewTier { min_mastery: 0.4, interval_days: 3 },
                ReviewTier { min_mastery: 0.6, interval_days: 7 },
                ReviewTier { min_mastery: 0.8, interval_days: 14 },
            ],
        }
    }
}

impl ReviewConfig {
    /// Interval for the highest tier whose threshold `mastery` reaches.
    pub fn interval_for(&self, mastery: f64) -> u32 {
        self.tiers
            .iter()
            .rev()
            .find(|t| mastery >= t.min_mastery)
            .or_else(|| self.tiers.first())
            .map(|t| t.interval_days)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MisconceptionConfig {
    /// Consecutive clean correct answers needed to mark a misconception resolved.
    pub resolve_after: u32,
}

impl Default for MisconceptionConfig {
    fn default() -> Self {
        Self { resolve_after: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub easy_below: f64,
    pub hard_above: f64,
    pub high_confidence: f64,
    /// Total calls made to the text generator per question (first try + retries).
    pub generator_attempts: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            easy_below: 0.4,
            hard_above: 0.7,
            high_confidence: 0.7,
            generator_attempts: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub new_share: f64,
    pub review_share: f64,
    pub practice_share: f64,
    pub weekly_hours: f64,
    pub max_session_hours: f64,
    /// Floor on a topic's allocation weight so mastered topics keep some time.
    pub min_weight: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            new_share: 0.4,
            review_share: 0.3,
            practice_share: 0.3,
            weekly_hours: 10.5,
            max_session_hours: 0.75,
            min_weight: 0.05,
        }
    }
}

impl TutorConfig {
    /// Parse a (possibly partial) JSON document and validate the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TutorConfig = serde_json::from_str(json).map_err(|e| invalid(format!("config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let m = &self.mastery;
        check_unit_interval("mastery.prior", m.prior)?;
        check_unit_interval("mastery.hint_factor", m.hint_factor)?;
        check_unit_interval("mastery.struggling_threshold", m.struggling_threshold)?;
        if !(m.learning_rate > 0.0 && m.learning_rate <= 1.0) {
            return Err(invalid(format!("mastery.learning_rate must be in (0, 1], got {}", m.learning_rate)));
        }
        if !(m.default_strength_days > 0.0 && m.default_strength_days.is_finite()) {
            return Err(invalid("mastery.default_strength_days must be positive".into()));
        }
        if !(m.strength_growth >= 1.0 && m.strength_growth.is_finite()) {
            return Err(invalid("mastery.strength_growth must be at least 1".into()));
        }
        if !m.max_strength_days.is_finite() || m.max_strength_days < m.default_strength_days {
            return Err(invalid("mastery.max_strength_days must not be below default_strength_days".into()));
        }

        let tiers = &self.review.tiers;
        match tiers.first() {
            Some(first) if first.min_mastery == 0.0 => {}
            _ => return Err(invalid("review.tiers must start at min_mastery 0".into())),
        }
        for tier in tiers {
            check_unit_interval("review tier min_mastery", tier.min_mastery)?;
            if tier.interval_days == 0 {
                return Err(invalid("review tier interval_days must be positive".into()));
            }
        }
        for pair in tiers.windows(2) {
            if pair[1].min_mastery <= pair[0].min_mastery || pair[1].interval_days < pair[0].interval_days {
                return Err(invalid("review.tiers must increase in mastery with non-decreasing intervals".into()));
            }
        }

        if self.misconception.resolve_after == 0 {
            return Err(invalid("misconception.resolve_after must be positive".into()));
        }

        let q = &self.quiz;
        check_unit_interval("quiz.easy_below", q.easy_below)?;
        check_unit_interval("quiz.hard_above", q.hard_above)?;
        check_unit_interval("quiz.high_confidence", q.high_confidence)?;
        if q.easy_below > q.hard_above {
            return Err(invalid("quiz.easy_below must not exceed quiz.hard_above".into()));
        }
        if q.generator_attempts == 0 {
            return Err(invalid("quiz.generator_attempts must be positive".into()));
        }

        let p = &self.planner;
        check_unit_interval("planner.new_share", p.new_share)?;
        check_unit_interval("planner.review_share", p.review_share)?;
        check_unit_interval("planner.practice_share", p.practice_share)?;
        let sum = p.new_share + p.review_share + p.practice_share;
        if (sum - 1.0).abs() > SHARE_TOLERANCE {
            return Err(invalid(format!("planner shares must sum to 1, got {sum}")));
        }
        if !(p.weekly_hours > 0.0 && p.weekly_hours.is_finite()) {
            return Err(invalid("planner.weekly_hours must be positive".into()));
        }
        if !(p.max_session_hours > 0.0 && p.max_session_hours.is_finite()) {
            return Err(invalid("planner.max_session_hours must be positive".into()));
        }
        if !(p.min_weight > 0.0 && p.min_weight <= 1.0) {
            return Err(invalid("planner.min_weight must be in (0, 1]".into()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> TutorError {
    TutorError::Validation(msg)
}
