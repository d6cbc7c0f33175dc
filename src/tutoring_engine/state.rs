//! Per-learner knowledge state.
//!
//! `StudentState` is a plain value owned by the caller. It is read freely but
//! only mutated through [`StudentModel`](crate::tutoring_engine::student_model::StudentModel),
//! which keeps mastery records, history, misconceptions and review entries in
//! step with each other.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tutoring_engine::error::{Result, TutorError};
use crate::tutoring_engine::models::{
    check_unit_interval, InteractionEvent, MasteryRecord, Misconception, ReviewEntry, TopicId,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentState {
    pub learner_id: String,
    pub(crate) records: BTreeMap<TopicId, MasteryRecord>,
    pub(crate) history: Vec<InteractionEvent>,
    pub(crate) misconceptions: Vec<Misconception>,
    pub(crate) reviews: BTreeMap<TopicId, ReviewEntry>,
}

impl StudentState {
    pub fn new(learner_id: impl Into<String>) -> Self {
        StudentState {
            learner_id: learner_id.into(),
            ..Default::default()
        }
    }

    pub fn record(&self, topic: &TopicId) -> Option<&MasteryRecord> {
        self.records.get(topic)
    }

    pub fn records(&self) -> impl Iterator<Item = &MasteryRecord> {
        self.records.values()
    }

    pub fn topics(&self) -> impl Iterator<Item = &TopicId> {
        self.records.keys()
    }

    pub fn history(&self) -> &[InteractionEvent] {
        &self.history
    }

    pub fn interactions_for<'a>(&'a self, topic: &'a TopicId) -> impl Iterator<Item = &'a InteractionEvent> {
        self.history.iter().filter(move |e| &e.topic == topic)
    }

    /// Whether any interaction was ever recorded for `topic`.
    pub fn has_interacted(&self, topic: &TopicId) -> bool {
        self.records
            .get(topic)
            .map_or(false, |r| r.last_interaction.is_some())
    }

    pub fn last_interaction(&self, topic: &TopicId) -> Option<DateTime<Utc>> {
        self.records.get(topic).and_then(|r| r.last_interaction)
    }

    /// Fraction of recorded answers on `topic` that were correct.
    pub fn accuracy(&self, topic: &TopicId) -> Option<f64> {
        accuracy_of(self.interactions_for(topic))
    }

    pub fn overall_accuracy(&self) -> Option<f64> {
        accuracy_of(self.history.iter())
    }

    pub fn misconceptions(&self) -> &[Misconception] {
        &self.misconceptions
    }

    pub fn open_misconceptions(&self) -> impl Iterator<Item = &Misconception> {
        self.misconceptions.iter().filter(|m| !m.resolved)
    }

    pub fn review(&self, topic: &TopicId) -> Option<&ReviewEntry> {
        self.reviews.get(topic)
    }

    pub fn reviews(&self) -> impl Iterator<Item = &ReviewEntry> {
        self.reviews.values()
    }

    pub(crate) fn ensure_record(&mut self, topic: &TopicId, prior: f64, strength_days: f64) -> &mut MasteryRecord {
        self.records.entry(topic.clone()).or_insert_with(|| MasteryRecord {
            topic: topic.clone(),
            mastery: prior,
            strength_days,
            practice_count: 0,
            last_interaction: None,
        })
    }

    pub(crate) fn misconception_entry(&mut self, topic: &TopicId, kind: &str) -> &mut Misconception {
        let idx = match self
            .misconceptions
            .iter()
            .position(|m| &m.topic == topic && m.kind == kind)
        {
            Some(idx) => idx,
            None => {
                self.misconceptions.push(Misconception {
                    kind: kind.to_string(),
                    topic: topic.clone(),
                    detection_count: 0,
                    clean_streak: 0,
                    resolved: false,
                });
                self.misconceptions.len() - 1
            }
        };
        &mut self.misconceptions[idx]
    }

    /// Check the invariants a restored state must satisfy.
    pub fn validate(&self) -> Result<()> {
        for (topic, record) in &self.records {
            if &record.topic != topic {
                return Err(TutorError::Validation(format!(
                    "record keyed as {topic} belongs to {}",
                    record.topic
                )));
            }
            check_unit_interval(&format!("mastery of {topic}"), record.mastery)?;
            if !(record.strength_days > 0.0 && record.strength_days.is_finite()) {
                return Err(TutorError::Validation(format!(
                    "strength of {topic} must be positive, got {}",
                    record.strength_days
                )));
            }
        }
        for event in &self.history {
            check_unit_interval("interaction confidence", event.confidence)?;
            if !self.has_interacted(&event.topic) {
                return Err(TutorError::Validation(format!(
                    "interaction recorded for {} but its mastery record has no interaction time",
                    event.topic
                )));
            }
        }
        for entry in self.reviews.values() {
            check_unit_interval(&format!("scheduled mastery of {}", entry.topic), entry.mastery_at_schedule)?;
        }
        Ok(())
    }
}

fn accuracy_of<'a>(events: impl Iterator<Item = &'a InteractionEvent>) -> Option<f64> {
    let (total, correct) = events.fold((0u32, 0u32), |(t, c), e| (t + 1, c + u32::from(e.correct)));
    (total > 0).then(|| f64::from(correct) / f64::from(total))
}
