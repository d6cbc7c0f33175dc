//! Pre-authored question bank.
//!
//! Consulted only after the text generator has used up its attempts. Entries
//! are validated on insert, so anything the bank returns is already
//! well-formed and aligned with its declared difficulty.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tutoring_engine::{
    error::{Result, TutorError},
    helpers::validate_content,
    models::{BloomLevel, Difficulty, GeneratedContent, PromptRequest, TopicId},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankQuestion {
    pub topic: TopicId,
    pub difficulty: Difficulty,
    pub bloom_level: BloomLevel,
    pub content: GeneratedContent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    entries: Vec<BankQuestion>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handful of graph-search questions, enough to keep a demo running
    /// without a generator.
    pub fn builtin() -> Self {
        let mut bank = Self::new();
        let items: [(&str, Difficulty, BloomLevel, &str, &str, &[&str]); 6] = [
            ("bfs", Difficulty::Easy, BloomLevel::Remember,
             "Which data structure holds the frontier in breadth-first search?",
             "queue", &["stack", "heap"]),
            ("bfs", Difficulty::Medium, BloomLevel::Apply,
             "On an unweighted graph, BFS from s reaches t at depth 3. What is the length of the shortest s-t path?",
             "3", &["2", "4"]),
            ("dfs", Difficulty::Easy, BloomLevel::Understand,
             "Why can depth-first search be written recursively without an explicit stack?",
             "the call stack holds the frontier", &["it visits nodes level by level"]),
            ("dfs", Difficulty::Hard, BloomLevel::Analyze,
             "A DFS finds a back edge (u, v). What does that tell you about the directed graph?",
             "it contains a cycle", &["it is a tree", "it is bipartite"]),
            ("astar", Difficulty::Medium, BloomLevel::Apply,
             "With h(n) = 0 for every node, which algorithm does A* reduce to?",
             "dijkstra", &["bfs", "dfs"]),
            ("astar", Difficulty::Hard, BloomLevel::Evaluate,
             "A heuristic overestimates the true cost on some nodes. Is A* still guaranteed to return an optimal path?",
             "no", &["yes"]),
        ];
        for (topic, difficulty, bloom_level, prompt, answer, distractors) in items {
            let question = BankQuestion {
                topic: topic.into(),
                difficulty,
                bloom_level,
                content: GeneratedContent {
                    prompt_text: prompt.to_string(),
                    canonical_answer: answer.to_string(),
                    distractors: distractors.iter().map(|d| d.to_string()).collect(),
                },
            };
            // Built-in entries are aligned by construction.
            bank.entries.push(question);
        }
        bank
    }

    pub fn add(&mut self, question: BankQuestion) -> Result<()> {
        if !question.difficulty.admits(question.bloom_level) {
            return Err(TutorError::Validation(format!(
                "bloom level {} is not aligned with {} difficulty",
                question.bloom_level, question.difficulty
            )));
        }
        validate_content(&question.content).map_err(TutorError::Validation)?;
        self.entries.push(question);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Random entry for the request's topic and difficulty, preferring ones at
    /// the requested Bloom level. Returns the entry's own Bloom level.
    pub fn pick<R: Rng>(&self, request: &PromptRequest, rng: &mut R) -> Option<(BloomLevel, GeneratedContent)> {
        let candidates: Vec<&BankQuestion> = self
            .entries
            .iter()
            .filter(|q| q.topic == request.topic && q.difficulty == request.difficulty)
            .collect();
        let exact: Vec<&BankQuestion> = candidates
            .iter()
            .copied()
            .filter(|q| q.bloom_level == request.bloom_level)
            .collect();
        let pool = if exact.is_empty() { candidates } else { exact };
        if pool.is_empty() {
            return None;
        }
        let chosen = pool[rng.gen_range(0..pool.len())];
        Some((chosen.bloom_level, chosen.content.clone()))
    }
}
