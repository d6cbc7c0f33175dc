//! Registry of known error patterns per topic.
//!
//! A signature is a set of lowercase markers; an answer signature triggers it
//! when any marker occurs in the lowercased answer text. The registry is
//! reference data: detection counts and resolution live in `StudentState`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tutoring_engine::models::TopicId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MisconceptionSignature {
    pub kind: String,
    pub markers: Vec<String>,
}

impl MisconceptionSignature {
    pub fn matches(&self, answer_signature: &str) -> bool {
        let haystack = answer_signature.to_lowercase();
        self.markers.iter().any(|m| haystack.contains(m.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MisconceptionRegistry {
    by_topic: BTreeMap<TopicId, Vec<MisconceptionSignature>>,
}

impl MisconceptionRegistry {
    /// An empty registry; see [`MisconceptionRegistry::builtin`] for the stock set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Common algorithm-course confusions.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        // BFS answered with depth-first behaviour and vice versa.
        registry.register("bfs", "traversal_direction", &["stack", "depth-first", "depth first", "lifo", "backtrack"]);
        registry.register("dfs", "traversal_direction", &["queue", "breadth-first", "breadth first", "fifo", "level by level"]);
        registry.register("binary_search", "off_by_one", &["lo = mid", "low = mid", "hi = mid + 1", "infinite loop"]);
        registry.register("recursion", "missing_base_case", &["no base case", "stack overflow", "never terminates"]);
        registry.register("astar", "inadmissible_heuristic", &["overestimate", "heuristic larger than", "non-admissible"]);
        registry
    }

    pub fn register(&mut self, topic: impl Into<TopicId>, kind: &str, markers: &[&str]) {
        let signature = MisconceptionSignature {
            kind: kind.to_string(),
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        };
        let entries = self.by_topic.entry(topic.into()).or_default();
        match entries.iter_mut().find(|s| s.kind == signature.kind) {
            Some(existing) => existing.markers.extend(signature.markers),
            None => entries.push(signature),
        }
    }

    /// First registered signature for `topic` that `answer_signature` triggers.
    pub fn match_signature(&self, topic: &TopicId, answer_signature: &str) -> Option<&MisconceptionSignature> {
        self.by_topic
            .get(topic)?
            .iter()
            .find(|s| s.matches(answer_signature))
    }

    pub fn signatures(&self, topic: &TopicId) -> &[MisconceptionSignature] {
        self.by_topic.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }
}
