//! Prerequisite graph and topological ordering (Kahn's algorithm).
//!
//! A topic's in-degree is the number of its own prerequisites inside the set
//! being ordered. Zero in-degree topics are emitted first; emitting a topic
//! decrements the in-degree of the topics that depend on it. Prerequisites
//! outside the ordered set count as already satisfied.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::tutoring_engine::{
    error::{Result, TutorError},
    models::{Topic, TopicId},
};

/// topic -> the topics it requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrerequisiteGraph {
    edges: BTreeMap<TopicId, BTreeSet<TopicId>>,
}

impl PrerequisiteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_topics(topics: &[Topic]) -> Self {
        topics
            .iter()
            .map(|t| (t.id.clone(), t.prerequisites.clone()))
            .collect()
    }

    pub fn add_prerequisite(&mut self, topic: impl Into<TopicId>, prerequisite: impl Into<TopicId>) {
        self.edges.entry(topic.into()).or_default().insert(prerequisite.into());
    }

    pub fn prerequisites(&self, topic: &TopicId) -> impl Iterator<Item = &TopicId> {
        self.edges.get(topic).into_iter().flatten()
    }
}

impl FromIterator<(TopicId, BTreeSet<TopicId>)> for PrerequisiteGraph {
    fn from_iter<I: IntoIterator<Item = (TopicId, BTreeSet<TopicId>)>>(iter: I) -> Self {
        let mut graph = PrerequisiteGraph::new();
        for (topic, prerequisites) in iter {
            graph.edges.entry(topic).or_default().extend(prerequisites);
        }
        graph
    }
}

/// Order `topics` so every topic follows its prerequisites; ties break by id.
pub fn optimize_topic_order(topics: &BTreeSet<TopicId>, graph: &PrerequisiteGraph) -> Result<Vec<TopicId>> {
    order_topics_by(topics, graph, |a, b| a.cmp(b))
}

/// Kahn's algorithm where, among the topics ready at each step, the one that
/// sorts first under `prefer` is emitted next.
pub fn order_topics_by<F>(topics: &BTreeSet<TopicId>, graph: &PrerequisiteGraph, prefer: F) -> Result<Vec<TopicId>>
where
    F: Fn(&TopicId, &TopicId) -> Ordering,
{
    let mut in_degree: BTreeMap<&TopicId, usize> = BTreeMap::new();
    let mut dependents: BTreeMap<&TopicId, Vec<&TopicId>> = BTreeMap::new();
    for topic in topics {
        let mut own = 0;
        for prerequisite in graph.prerequisites(topic).filter(|p| topics.contains(*p)) {
            own += 1;
            dependents.entry(prerequisite).or_default().push(topic);
        }
        in_degree.insert(topic, own);
    }

    let mut ready: Vec<&TopicId> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(t, _)| *t)
        .collect();
    let mut order = Vec::with_capacity(topics.len());

    while let Some(idx) = ready
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| prefer(**a, **b))
        .map(|(i, _)| i)
    {
        let topic = ready.swap_remove(idx);
        order.push(topic.clone());
        for dependent in dependents.get(topic).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(*dependent);
                }
            }
        }
    }

    if order.len() < topics.len() {
        let placed: BTreeSet<&TopicId> = order.iter().collect();
        let unresolved: BTreeSet<TopicId> = topics
            .iter()
            .filter(|t| !placed.contains(t))
            .cloned()
            .collect();
        return Err(TutorError::Structural { unresolved });
    }
    Ok(order)
}
