use std::collections::BTreeSet;

use thiserror::Error;

use crate::tutoring_engine::models::TopicId;

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("prerequisite cycle among topics: {}", join_topics(.unresolved))]
    Structural { unresolved: BTreeSet<TopicId> },
    #[error("question generator failed for {topic} after {attempts} attempt(s): {reason}")]
    Generator {
        topic: TopicId,
        attempts: u32,
        reason: String,
    },
    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    UnsupportedSnapshotVersion(u32),
}

pub type Result<T> = std::result::Result<T, TutorError>;

fn join_topics(topics: &BTreeSet<TopicId>) -> String {
    topics.iter().map(TopicId::as_str).collect::<Vec<_>>().join(", ")
}
