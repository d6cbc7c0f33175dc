//! A short tutoring session over a three-topic graph-search course.
//!
//! Run with: `cargo run --example tutor_session`
//! Set `RUST_LOG=tutor_core=debug` to watch every mastery update.
//!
//! This example shows how `tutor_core` works end to end:
//!
//! 1. **Quiz loop**: quiz the learner on BFS, grade each answer, feed the
//!    result back into the student model, and watch the difficulty climb.
//! 2. **Fallback**: a text generator that goes down mid-session, with the
//!    built-in question bank covering for it.
//! 3. **Planning**: a prerequisite-ordered exam-prep plan and a balanced week.
//! 4. **Persistence**: export the learner, store it, load it back.
//!
//! ## Key concepts demonstrated
//!
//! - The caller owns `StudentState` and passes `now` explicitly.
//! - `QuizGenerator` never mutates learner state; its `QuizResponse` is what
//!   the caller hands to `StudentModel::update_mastery`.
//! - `QuizRequest::seeded` makes question ids and bank picks reproducible.

use std::cell::Cell;
use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tutor_core::{
    Difficulty, GeneratedContent, LearnerStore, MemoryStore, PrerequisiteGraph, PromptRequest,
    QuestionBank, QuizConfig, QuizGenerator, QuizRequest, StudentModel, StudentState, StudyPlanner,
    Topic, TopicId,
};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tutor_core=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

/// Stand-in for an LLM: writes a BFS question at the requested Bloom level.
fn bfs_writer(req: &PromptRequest) -> Result<GeneratedContent, String> {
    let prompt = match req.difficulty {
        Difficulty::Easy   => "Which data structure does BFS use for its frontier?",
        Difficulty::Medium => "BFS from s first reaches t while expanding depth 2. How many edges are on the shortest s-t path?",
        Difficulty::Hard   => "Why does BFS give shortest paths on unweighted graphs but not on weighted ones?",
    };
    let (answer, distractors) = match req.difficulty {
        Difficulty::Easy   => ("queue", vec!["stack".to_string(), "heap".to_string()]),
        Difficulty::Medium => ("3", vec!["2".to_string(), "4".to_string()]),
        Difficulty::Hard   => ("it expands by edge count not weight", vec![]),
    };
    Ok(GeneratedContent {
        prompt_text: format!("[{}] {prompt}", req.bloom_level),
        canonical_answer: answer.to_string(),
        distractors,
    })
}

fn main() {
    init_tracing();

    let course = vec![
        Topic::new("dfs", &[], Difficulty::Easy),
        Topic::new("bfs", &[], Difficulty::Easy),
        Topic::new("astar", &["dfs", "bfs"], Difficulty::Medium),
    ];
    let graph = PrerequisiteGraph::from_topics(&course);
    let all_topics: BTreeSet<TopicId> = course.iter().map(|t| t.id.clone()).collect();

    let model = StudentModel::default();
    let mut state = StudentState::new("ada");
    let start = Utc.with_ymd_and_hms(2024, 10, 7, 18, 0, 0).single().unwrap_or_else(Utc::now);
    let bfs = TopicId::from("bfs");

    // ── 1. quiz loop ─────────────────────────────────────────────────────────
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Quiz loop: bfs");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let mut quiz = QuizGenerator::new(bfs_writer, QuizConfig::default());
    let answers = ["Stack", "queue", "Queue.", "3", "3", "it expands by edge count not weight"];
    let mut now = start;
    for (turn, answer) in answers.iter().enumerate() {
        let question = match quiz.quiz_for(&model, &state, &bfs, 1, now) {
            Ok(mut qs) => qs.remove(0),
            Err(err) => {
                eprintln!("  quiz failed: {err}");
                return;
            }
        };
        let live = model.estimate_mastery(&state, &bfs, now);
        let response = match quiz.evaluate_answer_with_mastery(&question, answer, 0.8, live) {
            Ok(r) => r,
            Err(err) => {
                eprintln!("  grading failed: {err}");
                return;
            }
        };
        if !response.is_correct {
            if let Some(m) = model.detect_misconception(&mut state, &bfs, answer) {
                println!("  ! misconception: {} (seen {}x)", m.kind, m.detection_count);
            }
        }
        let mastery = model
            .update_mastery(&mut state, &bfs, response.is_correct, false, response.confidence, now)
            .unwrap_or(live);
        println!("  #{} {:<6} {}", turn + 1, question.difficulty.to_string(), question.prompt);
        println!("     answer {answer:?} -> {} | mastery {mastery:.2} | next: {}",
            if response.is_correct { "correct" } else { "wrong" }, response.next_action);
        now += Duration::minutes(3);
    }

    // ── 2. fallback ──────────────────────────────────────────────────────────
    println!();
    println!("  Generator outage on astar, bank takes over:");
    let calls = Cell::new(0);
    let flaky = |_: &PromptRequest| -> Result<GeneratedContent, String> {
        calls.set(calls.get() + 1);
        Err("upstream timeout".to_string())
    };
    let mut fallback = QuizGenerator::new(flaky, QuizConfig::default()).with_bank(QuestionBank::builtin());
    match fallback.generate(&QuizRequest::new("astar", 2, 0.5).seeded(7)) {
        Ok(questions) => {
            for q in &questions {
                println!("  {} [{:?}] {}", q.question_id, q.source, q.prompt);
            }
        }
        Err(err) => println!("  no questions: {err}"),
    }
    println!("  generator calls made: {}", calls.get());

    // ── 3. planning ──────────────────────────────────────────────────────────
    model.update_mastery(&mut state, &"dfs".into(), false, false, 0.6, now).ok();
    let planner = StudyPlanner::default();
    let later = now + Duration::days(2);
    let mastery = model.mastery_map(&state, later);

    println!();
    println!("  Exam prep (3 days x 2h):");
    match planner.plan_exam_prep(&all_topics, &graph, &mastery, 3, 2.0) {
        Ok(days) => {
            for day in &days {
                let line: Vec<String> = day
                    .sessions
                    .iter()
                    .map(|s| format!("{} {} {:.2}h", s.topic, s.activity, s.hours))
                    .collect();
                println!("  day {}: {}", day.day, line.join(", "));
            }
        }
        Err(err) => println!("  cannot plan: {err}"),
    }

    let due: BTreeSet<TopicId> = model.due_reviews(&state, later.date_naive()).into_iter().collect();
    println!();
    println!("  Week plan (due: {due:?}):");
    match planner.plan_week(&all_topics, &graph, &mastery, &due) {
        Ok(week) => {
            for day in &week.days {
                println!("  day {}: {:.2}h over {} sessions", day.day, day.total_hours(), day.sessions.len());
            }
        }
        Err(err) => println!("  cannot plan: {err}"),
    }

    // ── 4. persistence ───────────────────────────────────────────────────────
    let mut store = MemoryStore::new();
    match state.export() {
        Ok(snapshot) => {
            let size = snapshot.as_bytes().len();
            store.save(&state.learner_id, snapshot).ok();
            println!("\n  saved {} ({size} bytes)", state.learner_id);
        }
        Err(err) => println!("\n  export failed: {err}"),
    }
    let Some(snapshot) = store.load("ada").ok().flatten() else {
        println!("  nothing stored for ada");
        return;
    };
    match StudentState::import(&snapshot) {
        Ok(restored) => {
            let summary = model.summary(&restored, later);
            println!(
                "  restored: {} topics, mean mastery {:.2}, struggling {:?}, accuracy {:?}",
                summary.topics_tracked, summary.mean_mastery, summary.struggling, summary.accuracy
            );
        }
        Err(err) => println!("  import failed: {err}"),
    }
}
