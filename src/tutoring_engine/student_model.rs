//! Mastery estimation, updates and review scheduling for one learner.
//!
//! ## Forgetting
//!
//! Stored mastery is what the learner knew at their last interaction. Reads go
//! through [`StudentModel::estimate_mastery`], which applies
//! `stored * 0.5^(days_since_last_interaction / strength_days)`, but only for
//! topics with at least one recorded interaction. A topic whose mastery was
//! placed directly never decays.
//!
//! ## Updates
//!
//! An answer moves the current estimate a fraction of the way to its target
//! (1 for correct, 0 for incorrect). The fraction is `learning_rate`, scaled
//! by the learner's confidence and reduced when a hint was used, so steps
//! shrink near the bounds and the result never leaves [0, 1].

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::tutoring_engine::{
    config::TutorConfig,
    error::Result,
    misconceptions::MisconceptionRegistry,
    models::{check_unit_interval, InteractionEvent, MasteryMap, Misconception, ReviewEntry, TopicId},
    state::StudentState,
};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Snapshot of a learner's progress, for dashboards and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerSummary {
    pub learner_id: String,
    pub topics_tracked: usize,
    pub mean_mastery: f64,
    pub mastered: BTreeSet<TopicId>,
    pub struggling: BTreeSet<TopicId>,
    pub due_reviews: usize,
    pub open_misconceptions: Vec<Misconception>,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct StudentModel {
    config: TutorConfig,
    registry: MisconceptionRegistry,
}

impl Default for StudentModel {
    fn default() -> Self {
        StudentModel {
            config: TutorConfig::default(),
            registry: MisconceptionRegistry::builtin(),
        }
    }
}

impl StudentModel {
    /// Build a model with the built-in misconception registry.
    pub fn new(config: TutorConfig) -> Result<Self> {
        config.validate()?;
        Ok(StudentModel {
            config,
            registry: MisconceptionRegistry::builtin(),
        })
    }

    pub fn with_registry(mut self, registry: MisconceptionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    pub fn registry(&self) -> &MisconceptionRegistry {
        &self.registry
    }

    // ── reads ────────────────────────────────────────────────────────────────

    pub fn estimate_mastery(&self, state: &StudentState, topic: &TopicId, now: DateTime<Utc>) -> f64 {
        let Some(record) = state.record(topic) else {
            return self.config.mastery.prior;
        };
        match record.last_interaction {
            None => record.mastery,
            Some(last) => decayed(record.mastery, days_between(last, now), record.strength_days),
        }
    }

    /// Current estimates for every topic the learner has a record for.
    pub fn mastery_map(&self, state: &StudentState, now: DateTime<Utc>) -> MasteryMap {
        state
            .topics()
            .map(|t| (t.clone(), self.estimate_mastery(state, t, now)))
            .collect()
    }

    pub fn struggling_topics(
        &self,
        state: &StudentState,
        threshold: f64,
        now: DateTime<Utc>,
    ) -> Result<BTreeSet<TopicId>> {
        check_unit_interval("struggling threshold", threshold)?;
        Ok(state
            .topics()
            .filter(|t| self.estimate_mastery(state, t, now) < threshold)
            .cloned()
            .collect())
    }

    /// [`struggling_topics`](Self::struggling_topics) at the configured threshold.
    pub fn struggling(&self, state: &StudentState, now: DateTime<Utc>) -> BTreeSet<TopicId> {
        let threshold = self.config.mastery.struggling_threshold;
        state
            .topics()
            .filter(|t| self.estimate_mastery(state, t, now) < threshold)
            .cloned()
            .collect()
    }

    /// Topics whose review date is on or before `today`, earliest first.
    pub fn due_reviews(&self, state: &StudentState, today: NaiveDate) -> Vec<TopicId> {
        let mut due: Vec<&ReviewEntry> = state
            .reviews()
            .filter(|r| r.next_review_date <= today)
            .collect();
        due.sort_by(|a, b| {
            a.next_review_date
                .cmp(&b.next_review_date)
                .then_with(|| a.topic.cmp(&b.topic))
        });
        due.into_iter().map(|r| r.topic.clone()).collect()
    }

    pub fn summary(&self, state: &StudentState, now: DateTime<Utc>) -> LearnerSummary {
        let estimates = self.mastery_map(state, now);
        let mean_mastery = if estimates.is_empty() {
            0.0
        } else {
            estimates.values().sum::<f64>() / estimates.len() as f64
        };
        let mastered = estimates
            .iter()
            .filter(|(_, m)| **m > self.config.quiz.hard_above)
            .map(|(t, _)| t.clone())
            .collect();

        LearnerSummary {
            learner_id: state.learner_id.clone(),
            topics_tracked: estimates.len(),
            mean_mastery,
            mastered,
            struggling: self.struggling(state, now),
            due_reviews: self.due_reviews(state, now.date_naive()).len(),
            open_misconceptions: state.open_misconceptions().cloned().collect(),
            accuracy: state.overall_accuracy(),
        }
    }

    // ── writes ───────────────────────────────────────────────────────────────

    /// Place stored mastery directly (e.g. from a placement test) without
    /// recording an interaction.
    pub fn set_mastery(&self, state: &mut StudentState, topic: &TopicId, mastery: f64) -> Result<()> {
        check_unit_interval("mastery", mastery)?;
        let cfg = &self.config.mastery;
        state.ensure_record(topic, cfg.prior, cfg.default_strength_days).mastery = mastery;
        Ok(())
    }

    /// Apply one answer to `topic` and return the new mastery.
    pub fn update_mastery(
        &self,
        state: &mut StudentState,
        topic: &TopicId,
        correct: bool,
        hint_used: bool,
        confidence: f64,
        now: DateTime<Utc>,
    ) -> Result<f64> {
        check_unit_interval("confidence", confidence)?;
        let cfg = &self.config.mastery;

        let current = self.estimate_mastery(state, topic, now);
        let weight = cfg.learning_rate * (0.5 + 0.5 * confidence);
        let updated = if correct {
            let gain = if hint_used { weight * cfg.hint_factor } else { weight };
            current + gain * (1.0 - current)
        } else {
            current - weight * current
        }
        .clamp(0.0, 1.0);

        let record = state.ensure_record(topic, cfg.prior, cfg.default_strength_days);
        record.mastery = updated;
        record.practice_count += 1;
        record.last_interaction = Some(now);
        if correct && !hint_used {
            record.strength_days = (record.strength_days * cfg.strength_growth).min(cfg.max_strength_days);
        } else if !correct {
            record.strength_days = (record.strength_days / cfg.strength_growth).max(cfg.default_strength_days);
        }
        let strength_days = record.strength_days;

        state.history.push(InteractionEvent {
            topic: topic.clone(),
            correct,
            hint_used,
            confidence,
            timestamp: now,
        });

        self.advance_misconceptions(state, topic, correct);
        let next_review = self.schedule_review(state, topic, now);

        debug!(
            learner = %state.learner_id,
            topic = %topic,
            correct,
            hint_used,
            from = current,
            to = updated,
            strength_days,
            next_review = %next_review,
            "mastery updated"
        );
        Ok(updated)
    }

    /// Match an error pattern against the registry, recording a detection.
    pub fn detect_misconception(
        &self,
        state: &mut StudentState,
        topic: &TopicId,
        answer_signature: &str,
    ) -> Option<Misconception> {
        let signature = self.registry.match_signature(topic, answer_signature)?;
        let cfg = &self.config.mastery;
        state.ensure_record(topic, cfg.prior, cfg.default_strength_days);

        let entry = state.misconception_entry(topic, &signature.kind);
        entry.detection_count += 1;
        entry.clean_streak = 0;
        entry.resolved = false;
        let detected = entry.clone();
        info!(
            learner = %state.learner_id,
            topic = %topic,
            kind = %detected.kind,
            detections = detected.detection_count,
            "misconception detected"
        );
        Some(detected)
    }

    /// Recompute and store the review entry for `topic`, returning its date.
    /// An unseen topic gets a prior record so every scheduled review has one.
    pub fn schedule_review(&self, state: &mut StudentState, topic: &TopicId, now: DateTime<Utc>) -> NaiveDate {
        let cfg = &self.config.mastery;
        state.ensure_record(topic, cfg.prior, cfg.default_strength_days);
        let mastery = self.estimate_mastery(state, topic, now);
        let mut interval_days = self.config.review.interval_for(mastery);
        if let Some(previous) = state.review(topic) {
            if mastery >= previous.mastery_at_schedule {
                interval_days = interval_days.max(previous.interval_days);
            }
        }

        let next_review_date = now.date_naive() + Duration::days(i64::from(interval_days));
        state.reviews.insert(
            topic.clone(),
            ReviewEntry {
                topic: topic.clone(),
                next_review_date,
                interval_days,
                mastery_at_schedule: mastery,
            },
        );
        next_review_date
    }

    fn advance_misconceptions(&self, state: &mut StudentState, topic: &TopicId, correct: bool) {
        let resolve_after = self.config.misconception.resolve_after;
        for entry in state
            .misconceptions
            .iter_mut()
            .filter(|m| &m.topic == topic && !m.resolved)
        {
            if !correct {
                entry.clean_streak = 0;
                continue;
            }
            entry.clean_streak += 1;
            if entry.clean_streak >= resolve_after {
                entry.resolved = true;
                info!(topic = %topic, kind = %entry.kind, "misconception resolved");
            }
        }
    }
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / MILLIS_PER_DAY).max(0.0)
}

fn decayed(mastery: f64, elapsed_days: f64, strength_days: f64) -> f64 {
    (mastery * 0.5f64.powf(elapsed_days / strength_days)).clamp(0.0, 1.0)
}
