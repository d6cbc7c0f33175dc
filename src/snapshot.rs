//! Export/import of learner state and the persistence seam.
//!
//! A [`Snapshot`] is opaque to callers: versioned JSON bytes that a storage
//! layer can keep anywhere. The engine never calls a store itself; the host
//! loads a snapshot, imports it, runs the engine, exports and saves.

use std::collections::HashMap;
use std::convert::Infallible;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::tutoring_engine::{
    error::{Result, TutorError},
    state::StudentState,
};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Snapshot(bytes.into())
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: u32,
    state: &'a StudentState,
}

/// Decoding side of [`Envelope`]; the state stays raw until the version is known.
#[derive(Deserialize)]
struct StoredEnvelope {
    version: u32,
    state: Value,
}

impl StudentState {
    /// Serialize the full state: mastery records, history, misconceptions
    /// and review schedule.
    pub fn export(&self) -> Result<Snapshot> {
        let bytes = serde_json::to_vec(&Envelope { version: SNAPSHOT_VERSION, state: self })?;
        debug!(learner = %self.learner_id, bytes = bytes.len(), "exported learner state");
        Ok(Snapshot(bytes))
    }

    /// Restore a state from [`export`](Self::export) output. The restored
    /// state is re-validated, so out-of-range mastery is rejected here.
    pub fn import(snapshot: &Snapshot) -> Result<StudentState> {
        let envelope: StoredEnvelope = match serde_json::from_slice(snapshot.as_bytes())? {
            Value::Object(map) => serde_json::from_value(Value::Object(map))?,
            other => {
                return Err(TutorError::Validation(format!(
                    "snapshot must be a JSON object, found {}",
                    json_kind(&other)
                )))
            }
        };
        if envelope.version != SNAPSHOT_VERSION {
            return Err(TutorError::UnsupportedSnapshotVersion(envelope.version));
        }
        let state: StudentState = serde_json::from_value(envelope.state)?;
        state.validate()?;
        debug!(learner = %state.learner_id, topics = state.records.len(), "imported learner state");
        Ok(state)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}

/// Where the host keeps snapshots between sessions.
pub trait LearnerStore {
    type Error;

    fn load(&self, learner_id: &str) -> std::result::Result<Option<Snapshot>, Self::Error>;
    fn save(&mut self, learner_id: &str, snapshot: Snapshot) -> std::result::Result<(), Self::Error>;
}

/// In-process store keyed by learner id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshots: HashMap<String, Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl LearnerStore for MemoryStore {
    type Error = Infallible;

    fn load(&self, learner_id: &str) -> std::result::Result<Option<Snapshot>, Infallible> {
        Ok(self.snapshots.get(learner_id).cloned())
    }

    fn save(&mut self, learner_id: &str, snapshot: Snapshot) -> std::result::Result<(), Infallible> {
        self.snapshots.insert(learner_id.to_string(), snapshot);
        Ok(())
    }
}
