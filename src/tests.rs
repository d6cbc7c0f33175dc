//! End-to-end tests for the `tutor_core` crate.
//!
//! Included from `lib.rs` under `#[cfg(test)]`. Per-module behaviour is
//! tested next to each module; these cover the flows that cross modules.
//!
//! # Coverage
//!
//! | Group | What is tested |
//! |-------|----------------|
//! | Decay | Worked half-life example; directly placed mastery stays put |
//! | Grading | Canonical answer accepted; Bloom level copied into the response |
//! | Ordering | dfs/bfs before astar, every topic exactly once; cycles named |
//! | Planning | Exam prep favours weak topics; week mix follows due reviews |
//! | Loop | Answer → update → next difficulty tracks the live estimate |
//! | Failure isolation | Failed generation or planning leaves learner state untouched |
//! | Persistence | Snapshot survives a store round trip mid-session |

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::snapshot::{LearnerStore, MemoryStore};
use crate::tutoring_engine::{
    optimize_topic_order, ActivityKind, BloomLevel, Difficulty, GeneratedContent, NextAction,
    PrerequisiteGraph, PromptRequest, Question, QuestionBank, QuestionSource, QuizConfig,
    QuizGenerator, QuizRequest, StudentModel, StudentState, StudyPlanner, Topic, TopicId,
    TutorConfig, TutorError,
};

// ── helpers ──────────────────────────────────────────────────────────────────

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 8, 30, 0).unwrap()
}

fn topics(ids: &[&str]) -> BTreeSet<TopicId> {
    ids.iter().map(|s| TopicId::from(*s)).collect()
}

/// Writer that always answers "queue" and tags the prompt with its Bloom level.
fn queue_writer(req: &PromptRequest) -> Result<GeneratedContent, String> {
    Ok(GeneratedContent {
        prompt_text: format!("[{}/{}] Which structure holds the frontier in {}?", req.difficulty, req.bloom_level, req.topic),
        canonical_answer: "queue".into(),
        distractors: vec!["stack".into(), "heap".into()],
    })
}

/// The course graph used throughout: astar builds on both searches.
fn search_course() -> Vec<Topic> {
    vec![
        Topic::new("dfs", &[], Difficulty::Easy),
        Topic::new("bfs", &[], Difficulty::Easy),
        Topic::new("astar", &["dfs", "bfs"], Difficulty::Medium),
    ]
}

fn question_with_answer(answer: &str, bloom_level: BloomLevel) -> Question {
    Question {
        question_id: "Q-BFS-0000BEEF".into(),
        topic: "bfs".into(),
        difficulty: Difficulty::Easy,
        bloom_level,
        prompt: "Pick the option for a FIFO frontier.".into(),
        canonical_answer: answer.into(),
        distractors: vec!["B".into(), "C".into()],
        source: QuestionSource::Generated,
        mastery_snapshot: 0.3,
    }
}

// ── decay ────────────────────────────────────────────────────────────────────

#[test]
fn mastery_decays_to_a_quarter_after_two_half_lives() {
    let model = StudentModel::default();
    let mut state = StudentState::new("learner");
    let topic = TopicId::from("astar");
    let record = state.ensure_record(&topic, 0.2, 7.0);
    record.mastery = 0.8;
    record.last_interaction = Some(t0());

    let estimate = model.estimate_mastery(&state, &topic, t0() + Duration::days(14));
    assert!((estimate - 0.2).abs() < 1e-12, "got {estimate}");
}

#[test]
fn placed_mastery_ignores_elapsed_time() {
    let model = StudentModel::default();
    let mut state = StudentState::new("learner");
    let topic = TopicId::from("recursion");
    model.set_mastery(&mut state, &topic, 0.55).unwrap();
    for years in [0, 1, 5] {
        let later = t0() + Duration::days(365 * years);
        assert_eq!(model.estimate_mastery(&state, &topic, later), 0.55);
    }
}

// ── grading ──────────────────────────────────────────────────────────────────

#[test]
fn canonical_answer_is_correct_and_keeps_bloom_level() {
    let quiz = QuizGenerator::new(queue_writer, QuizConfig::default());
    for level in [BloomLevel::Remember, BloomLevel::Understand] {
        let response = quiz.evaluate_answer(&question_with_answer("A", level), "A", 0.9).unwrap();
        assert!(response.is_correct);
        assert_eq!(response.bloom_level, level);
    }
}

// ── ordering ─────────────────────────────────────────────────────────────────

#[test]
fn astar_comes_after_both_searches() {
    let graph = PrerequisiteGraph::from_topics(&search_course());
    let order = optimize_topic_order(&topics(&["dfs", "bfs", "astar"]), &graph).unwrap();

    assert_eq!(order.len(), 3);
    let unique: BTreeSet<&TopicId> = order.iter().collect();
    assert_eq!(unique.len(), 3);
    let pos = |id: &str| order.iter().position(|t| t.as_str() == id).unwrap();
    assert!(pos("astar") > pos("dfs"));
    assert!(pos("astar") > pos("bfs"));
}

#[test]
fn cycle_reports_unresolved_topics() {
    let mut graph = PrerequisiteGraph::from_topics(&search_course());
    graph.add_prerequisite("dfs", "astar");
    let err = optimize_topic_order(&topics(&["dfs", "bfs", "astar"]), &graph).unwrap_err();
    match &err {
        TutorError::Structural { unresolved } => assert_eq!(unresolved, &topics(&["astar", "dfs"])),
        other => panic!("expected structural error, got {other:?}"),
    }
    assert!(err.to_string().contains("astar"));
}

// ── planning ─────────────────────────────────────────────────────────────────

#[test]
fn exam_prep_favours_the_weaker_topic() {
    let planner = StudyPlanner::default();
    let mastery = [(TopicId::from("graphs"), 0.2), (TopicId::from("sorting"), 0.9)]
        .into_iter()
        .collect();
    for days in [1, 3, 10] {
        let plan = planner
            .plan_exam_prep(&topics(&["graphs", "sorting"]), &PrerequisiteGraph::new(), &mastery, days, 1.5)
            .unwrap();
        let hours = |id: &str| -> f64 {
            plan.iter()
                .flat_map(|d| &d.sessions)
                .filter(|s| s.topic.as_str() == id)
                .map(|s| s.hours)
                .sum()
        };
        assert!(hours("graphs") > hours("sorting"), "{days} days");
    }
}

#[test]
fn weekly_plan_uses_the_model_review_queue() {
    let model = StudentModel::default();
    let planner = StudyPlanner::default();
    let course = search_course();
    let graph = PrerequisiteGraph::from_topics(&course);
    let all: BTreeSet<TopicId> = course.iter().map(|t| t.id.clone()).collect();

    let mut state = StudentState::new("learner");
    model.update_mastery(&mut state, &"dfs".into(), false, false, 0.5, t0()).unwrap();
    model.set_mastery(&mut state, &"bfs".into(), 0.5).unwrap();

    let today = (t0() + Duration::days(2)).date_naive();
    let due: BTreeSet<TopicId> = model.due_reviews(&state, today).into_iter().collect();
    assert_eq!(due, topics(&["dfs"]));

    let mastery = model.mastery_map(&state, t0() + Duration::days(2));
    let week = planner.plan_week(&all, &graph, &mastery, &due).unwrap();
    assert!((week.share(ActivityKind::Review) - 0.3).abs() < 1e-6);
    assert!(week.sessions().any(|s| s.topic.as_str() == "astar" && s.activity == ActivityKind::NewLearning));
    assert!(week.sessions().any(|s| s.topic.as_str() == "bfs" && s.activity == ActivityKind::Practice));
}

// ── loop ─────────────────────────────────────────────────────────────────────

#[test]
fn difficulty_follows_the_live_estimate_turn_by_turn() {
    let model = StudentModel::default();
    let mut state = StudentState::new("learner");
    let bfs = TopicId::from("bfs");
    let mut quiz = QuizGenerator::new(queue_writer, QuizConfig::default());

    let mut seen = Vec::new();
    let mut now = t0();
    for _ in 0..12 {
        let questions = quiz.quiz_for(&model, &state, &bfs, 1, now).unwrap();
        let question = &questions[0];
        seen.push(question.difficulty);
        assert!(question.difficulty.admits(question.bloom_level));

        let live = model.estimate_mastery(&state, &bfs, now);
        let response = quiz.evaluate_answer_with_mastery(question, "Queue.", 0.9, live).unwrap();
        assert!(response.is_correct);
        model
            .update_mastery(&mut state, &bfs, response.is_correct, false, response.confidence, now)
            .unwrap();
        now += Duration::minutes(5);
    }

    assert_eq!(seen.first(), Some(&Difficulty::Easy));
    assert_eq!(seen.last(), Some(&Difficulty::Hard));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn wrong_answer_sends_learner_back_to_review() {
    let model = StudentModel::default();
    let mut state = StudentState::new("learner");
    let bfs = TopicId::from("bfs");
    model.set_mastery(&mut state, &bfs, 0.9).unwrap();
    let mut quiz = QuizGenerator::new(queue_writer, QuizConfig::default());

    let q = quiz.quiz_for(&model, &state, &bfs, 1, t0()).unwrap().remove(0);
    assert_eq!(q.difficulty, Difficulty::Hard);
    let response = quiz.evaluate_answer(&q, "stack", 0.9).unwrap();
    assert_eq!(response.next_action, NextAction::ReviewTopic);

    model.detect_misconception(&mut state, &bfs, &response.student_answer).unwrap();
    let after = model
        .update_mastery(&mut state, &bfs, response.is_correct, false, response.confidence, t0())
        .unwrap();
    assert!(after < 0.9);
    assert_eq!(state.open_misconceptions().count(), 1);
}

// ── failure isolation ────────────────────────────────────────────────────────

#[test]
fn failed_generation_leaves_state_untouched() {
    let model = StudentModel::default();
    let mut state = StudentState::new("learner");
    let heaps = TopicId::from("heaps");
    model.update_mastery(&mut state, &heaps, true, false, 0.6, t0()).unwrap();
    let before = state.clone();

    let broken = |_: &PromptRequest| -> Result<GeneratedContent, String> { Err("timeout".into()) };
    let mut quiz = QuizGenerator::new(broken, QuizConfig::default()).with_bank(QuestionBank::builtin());
    let err = quiz.quiz_for(&model, &state, &heaps, 2, t0()).unwrap_err();
    assert!(matches!(err, TutorError::Generator { .. }));
    assert_eq!(state, before);

    let planner = StudyPlanner::default();
    let mastery = model.mastery_map(&state, t0());
    assert!(planner
        .plan_exam_prep(&topics(&["heaps"]), &PrerequisiteGraph::new(), &mastery, 0, 2.0)
        .is_err());
    assert_eq!(state, before);
}

#[test]
fn bank_questions_stay_aligned_with_difficulty() {
    let down = |_: &PromptRequest| -> Result<GeneratedContent, String> { Err("offline".into()) };
    let mut quiz = QuizGenerator::new(down, QuizConfig::default()).with_bank(QuestionBank::builtin());
    let questions = quiz.generate(&QuizRequest::new("dfs", 4, 0.1).seeded(2024)).unwrap();
    assert_eq!(questions.len(), 4);
    for q in &questions {
        assert_eq!(q.source, QuestionSource::Bank);
        assert!(q.difficulty.admits(q.bloom_level));
    }
}

// ── persistence ──────────────────────────────────────────────────────────────

#[test]
fn session_resumes_from_a_stored_snapshot() {
    let model = StudentModel::new(TutorConfig::default()).unwrap();
    let mut store = MemoryStore::new();
    let bfs = TopicId::from("bfs");

    let mut state = StudentState::new("learner-42");
    model.update_mastery(&mut state, &bfs, true, false, 0.7, t0()).unwrap();
    store.save(&state.learner_id, state.export().unwrap()).unwrap();

    let snapshot = store.load("learner-42").unwrap().unwrap();
    let mut resumed = StudentState::import(&snapshot).unwrap();
    let later = t0() + Duration::days(3);
    assert_eq!(model.estimate_mastery(&resumed, &bfs, later), model.estimate_mastery(&state, &bfs, later));

    model.update_mastery(&mut resumed, &bfs, true, false, 0.7, later).unwrap();
    assert_eq!(resumed.history().len(), 2);
    assert_eq!(resumed.accuracy(&bfs), Some(1.0));
}
