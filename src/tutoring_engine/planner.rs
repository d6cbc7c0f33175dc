//! Study planning over a learner's mastery map.
//!
//! ## Exam prep
//!
//! Hours are split across topics in proportion to `max(1 - mastery, min_weight)`
//! and laid out day by day in prerequisite order, weakest topic first among
//! those whose prerequisites are already placed. A topic that does not fit in
//! the remainder of a day continues on the next.
//!
//! ## Weekly plan
//!
//! The week is divided into three pools with target shares (default 40/30/30):
//!
//! | Pool         | Topics                                     |
//! |--------------|--------------------------------------------|
//! | New learning | not due, mastery below the easy threshold  |
//! | Review       | due for review and part of the plan        |
//! | Practice     | not due, mastery in the medium band        |
//!
//! An empty pool hands its share to new learning (or, if that is empty too,
//! to whatever pools remain). Each pool is spread evenly over seven days so
//! every day carries the same mix.

use std::collections::BTreeSet;

use crate::tutoring_engine::{
    config::{PlannerConfig, TutorConfig},
    error::{Result, TutorError},
    models::{check_unit_interval, ActivityKind, DayPlan, MasteryMap, StudySession, TopicId, WeekPlan},
    topo_order::{order_topics_by, PrerequisiteGraph},
};

const DAYS_PER_WEEK: usize = 7;
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct StudyPlanner {
    config: PlannerConfig,
    prior: f64,
    easy_below: f64,
    hard_above: f64,
}

impl Default for StudyPlanner {
    fn default() -> Self {
        Self::from_config(&TutorConfig::default())
    }
}

impl StudyPlanner {
    pub fn new(config: &TutorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: &TutorConfig) -> Self {
        StudyPlanner {
            config: config.planner.clone(),
            prior: config.mastery.prior,
            easy_below: config.quiz.easy_below,
            hard_above: config.quiz.hard_above,
        }
    }

    /// Split `available_days * hours_per_day` across `topics`, weakest first
    /// and never ahead of a prerequisite.
    pub fn plan_exam_prep(
        &self,
        topics: &BTreeSet<TopicId>,
        graph: &PrerequisiteGraph,
        mastery_map: &MasteryMap,
        available_days: u32,
        hours_per_day: f64,
    ) -> Result<Vec<DayPlan>> {
        if available_days == 0 {
            return Err(TutorError::Validation("available_days must be positive".into()));
        }
        if !(hours_per_day > 0.0 && hours_per_day.is_finite()) {
            return Err(TutorError::Validation(format!(
                "hours_per_day must be positive, got {hours_per_day}"
            )));
        }
        validate_mastery_map(mastery_map)?;
        if topics.is_empty() {
            return Ok(Vec::new());
        }

        let mastery = |t: &TopicId| self.mastery_of(mastery_map, t);
        let order = order_topics_by(topics, graph, |a, b| {
            mastery(a).total_cmp(&mastery(b)).then_with(|| a.cmp(b))
        })?;

        let total_hours = f64::from(available_days) * hours_per_day;
        let allocation = self.weighted_split(&order, mastery_map, total_hours);

        let mut days: Vec<DayPlan> = (1..=available_days)
            .map(|day| DayPlan { day, sessions: Vec::new() })
            .collect();
        let mut day_idx = 0;
        let mut left_today = hours_per_day;
        for (topic, hours) in allocation {
            let activity = self.activity_for(self.mastery_of(mastery_map, &topic));
            let mut remaining = hours;
            while remaining > EPSILON {
                let take = remaining.min(left_today);
                days[day_idx].sessions.push(StudySession { topic: topic.clone(), activity, hours: take });
                remaining -= take;
                left_today -= take;
                if left_today <= EPSILON {
                    if day_idx + 1 == days.len() {
                        // Rounding residue lands on the final day.
                        if remaining > EPSILON {
                            days[day_idx].sessions.push(StudySession { topic: topic.clone(), activity, hours: remaining });
                        }
                        break;
                    }
                    day_idx += 1;
                    left_today = hours_per_day;
                }
            }
        }
        Ok(days)
    }

    /// Balanced week of new learning, due reviews, and practice.
    pub fn plan_week(
        &self,
        topics: &BTreeSet<TopicId>,
        graph: &PrerequisiteGraph,
        mastery_map: &MasteryMap,
        due_reviews: &BTreeSet<TopicId>,
    ) -> Result<WeekPlan> {
        validate_mastery_map(mastery_map)?;
        if topics.is_empty() {
            return Ok(WeekPlan::default());
        }

        // Only due topics that are part of this plan get review time.
        let due: BTreeSet<TopicId> = due_reviews.intersection(topics).cloned().collect();
        let mut new_topics = BTreeSet::new();
        let mut practice_topics = BTreeSet::new();
        for topic in topics.difference(&due) {
            let m = self.mastery_of(mastery_map, topic);
            if m < self.easy_below {
                new_topics.insert(topic.clone());
            } else if m <= self.hard_above {
                practice_topics.insert(topic.clone());
            }
        }

        let shares = self.pool_shares(!new_topics.is_empty(), !due.is_empty(), !practice_topics.is_empty());
        if shares.iter().all(|s| *s <= 0.0) {
            return Ok(WeekPlan::default());
        }
        let weekly = self.config.weekly_hours;

        let mastery = |t: &TopicId| self.mastery_of(mastery_map, t);
        let new_order = order_topics_by(&new_topics, graph, |a, b| {
            mastery(a).total_cmp(&mastery(b)).then_with(|| a.cmp(b))
        })?;
        let review_order: Vec<TopicId> = due.into_iter().collect();
        let practice_order: Vec<TopicId> = practice_topics.into_iter().collect();

        let mut days: Vec<DayPlan> = (1..=DAYS_PER_WEEK as u32)
            .map(|day| DayPlan { day, sessions: Vec::new() })
            .collect();

        let new_alloc = self.weighted_split(&new_order, mastery_map, weekly * shares[0]);
        self.spread_over_week(&mut days, &new_alloc, ActivityKind::NewLearning);

        let per_review = if review_order.is_empty() { 0.0 } else { weekly * shares[1] / review_order.len() as f64 };
        let review_alloc: Vec<(TopicId, f64)> = review_order.into_iter().map(|t| (t, per_review)).collect();
        self.spread_over_week(&mut days, &review_alloc, ActivityKind::Review);

        let practice_alloc = self.weighted_split(&practice_order, mastery_map, weekly * shares[2]);
        self.spread_over_week(&mut days, &practice_alloc, ActivityKind::Practice);

        Ok(WeekPlan { days })
    }

    fn mastery_of(&self, mastery_map: &MasteryMap, topic: &TopicId) -> f64 {
        mastery_map.get(topic).copied().unwrap_or(self.prior)
    }

    fn activity_for(&self, mastery: f64) -> ActivityKind {
        if mastery < self.easy_below {
            ActivityKind::NewLearning
        } else if mastery <= self.hard_above {
            ActivityKind::Practice
        } else {
            ActivityKind::Review
        }
    }

    /// `total` hours split over `order` in proportion to each topic's weakness.
    fn weighted_split(&self, order: &[TopicId], mastery_map: &MasteryMap, total: f64) -> Vec<(TopicId, f64)> {
        let weights: Vec<f64> = order
            .iter()
            .map(|t| (1.0 - self.mastery_of(mastery_map, t)).max(self.config.min_weight))
            .collect();
        let sum: f64 = weights.iter().sum();
        if sum <= 0.0 {
            return Vec::new();
        }
        order
            .iter()
            .cloned()
            .zip(weights)
            .map(|(t, w)| (t, total * w / sum))
            .collect()
    }

    /// [new, review, practice] shares after moving empty pools' shares.
    fn pool_shares(&self, has_new: bool, has_review: bool, has_practice: bool) -> [f64; 3] {
        let cfg = &self.config;
        let mut shares = [cfg.new_share, cfg.review_share, cfg.practice_share];
        let present = [has_new, has_review, has_practice];

        if has_new {
            for idx in 1..3 {
                if !present[idx] {
                    shares[0] += shares[idx];
                    shares[idx] = 0.0;
                }
            }
            return shares;
        }

        let orphaned: f64 = (0..3).filter(|i| !present[*i]).map(|i| shares[i]).sum();
        let kept: f64 = (0..3).filter(|i| present[*i]).map(|i| shares[i]).sum();
        let live = present.iter().filter(|p| **p).count();
        for idx in 0..3 {
            shares[idx] = if !present[idx] {
                0.0
            } else if kept > 0.0 {
                shares[idx] + orphaned * shares[idx] / kept
            } else {
                (orphaned + kept) / live as f64
            };
        }
        shares
    }

    /// Lay `allocation` over the week in order, an equal slice per day, with
    /// no session longer than `max_session_hours`.
    fn spread_over_week(&self, days: &mut [DayPlan], allocation: &[(TopicId, f64)], activity: ActivityKind) {
        let total: f64 = allocation.iter().map(|(_, h)| h).sum();
        if total <= EPSILON || days.is_empty() {
            return;
        }
        let per_day = total / days.len() as f64;
        let max_session = self.config.max_session_hours;

        let mut day_idx = 0;
        let mut left_today = per_day;
        for (topic, hours) in allocation {
            let mut remaining = *hours;
            while remaining > EPSILON {
                let last_day = day_idx + 1 == days.len();
                let room = if last_day { remaining } else { left_today };
                let take = remaining.min(room).min(max_session);
                days[day_idx].sessions.push(StudySession { topic: topic.clone(), activity, hours: take });
                remaining -= take;
                left_today -= take;
                if left_today <= EPSILON && !last_day {
                    day_idx += 1;
                    left_today = per_day;
                }
            }
        }
    }
}

fn validate_mastery_map(mastery_map: &MasteryMap) -> Result<()> {
    for (topic, mastery) in mastery_map {
        check_unit_interval(&format!("mastery of {topic}"), *mastery)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<TopicId> {
        ids.iter().map(|s| TopicId::from(*s)).collect()
    }

    fn masteries(pairs: &[(&str, f64)]) -> MasteryMap {
        pairs.iter().map(|(t, m)| (TopicId::from(*t), *m)).collect()
    }

    fn hours_by_topic(days: &[DayPlan], topic: &str) -> f64 {
        days.iter()
            .flat_map(|d| d.sessions.iter())
            .filter(|s| s.topic.as_str() == topic)
            .map(|s| s.hours)
            .sum()
    }

    #[test]
    fn weaker_topic_gets_more_exam_prep_hours() {
        let planner = StudyPlanner::default();
        let plan = planner
            .plan_exam_prep(
                &set(&["weak", "strong"]),
                &PrerequisiteGraph::new(),
                &masteries(&[("weak", 0.2), ("strong", 0.9)]),
                5,
                2.0,
            )
            .unwrap();
        assert_eq!(plan.len(), 5);
        let weak = hours_by_topic(&plan, "weak");
        let strong = hours_by_topic(&plan, "strong");
        assert!(weak > strong, "weak={weak} strong={strong}");
        assert!((weak + strong - 10.0).abs() < 1e-6);
        for day in &plan {
            assert!(day.total_hours() <= 2.0 + 1e-6);
        }
    }

    #[test]
    fn exam_prep_never_studies_a_topic_before_its_prerequisites() {
        let planner = StudyPlanner::default();
        let mut graph = PrerequisiteGraph::new();
        graph.add_prerequisite("astar", "bfs");
        graph.add_prerequisite("astar", "dfs");
        let plan = planner
            .plan_exam_prep(
                &set(&["astar", "bfs", "dfs"]),
                &graph,
                &masteries(&[("astar", 0.0), ("bfs", 0.8), ("dfs", 0.6)]),
                3,
                1.5,
            )
            .unwrap();
        let sequence: Vec<&str> = plan
            .iter()
            .flat_map(|d| d.sessions.iter())
            .map(|s| s.topic.as_str())
            .collect();
        let first_astar = sequence.iter().position(|t| *t == "astar").unwrap();
        let last_bfs = sequence.iter().rposition(|t| *t == "bfs").unwrap();
        let last_dfs = sequence.iter().rposition(|t| *t == "dfs").unwrap();
        assert!(first_astar > last_bfs && first_astar > last_dfs);
        // Weaker of the two roots goes first.
        assert_eq!(sequence[0], "dfs");
    }

    #[test]
    fn exam_prep_validates_its_inputs() {
        let planner = StudyPlanner::default();
        let graph = PrerequisiteGraph::new();
        let topics = set(&["a"]);
        let ok = masteries(&[("a", 0.5)]);
        assert!(matches!(planner.plan_exam_prep(&topics, &graph, &ok, 0, 1.0), Err(TutorError::Validation(_))));
        assert!(matches!(planner.plan_exam_prep(&topics, &graph, &ok, 3, 0.0), Err(TutorError::Validation(_))));
        assert!(matches!(planner.plan_exam_prep(&topics, &graph, &ok, 3, -2.0), Err(TutorError::Validation(_))));
        let bad = masteries(&[("a", 1.4)]);
        assert!(matches!(planner.plan_exam_prep(&topics, &graph, &bad, 3, 1.0), Err(TutorError::Validation(_))));
    }

    #[test]
    fn exam_prep_on_empty_topics_is_empty() {
        let planner = StudyPlanner::default();
        let plan = planner
            .plan_exam_prep(&BTreeSet::new(), &PrerequisiteGraph::new(), &MasteryMap::new(), 4, 2.0)
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn exam_prep_rejects_cyclic_prerequisites() {
        let planner = StudyPlanner::default();
        let mut graph = PrerequisiteGraph::new();
        graph.add_prerequisite("a", "b");
        graph.add_prerequisite("b", "a");
        let err = planner
            .plan_exam_prep(&set(&["a", "b"]), &graph, &MasteryMap::new(), 2, 1.0)
            .unwrap_err();
        assert!(matches!(err, TutorError::Structural { .. }));
    }

    #[test]
    fn week_hits_target_mix() {
        let planner = StudyPlanner::default();
        let plan = planner
            .plan_week(
                &set(&["new1", "new2", "mid", "due"]),
                &PrerequisiteGraph::new(),
                &masteries(&[("new1", 0.1), ("new2", 0.3), ("mid", 0.55), ("due", 0.8)]),
                &set(&["due"]),
            )
            .unwrap();
        assert_eq!(plan.days.len(), 7);
        assert!((plan.total_hours() - 10.5).abs() < 1e-6);
        assert!((plan.share(ActivityKind::NewLearning) - 0.4).abs() < 1e-6);
        assert!((plan.share(ActivityKind::Review) - 0.3).abs() < 1e-6);
        assert!((plan.share(ActivityKind::Practice) - 0.3).abs() < 1e-6);
        for session in plan.sessions() {
            assert!(session.hours <= 0.75 + 1e-9);
        }
        for day in &plan.days {
            assert!((day.total_hours() - 1.5).abs() < 1e-6, "day {} has {}", day.day, day.total_hours());
        }
    }

    #[test]
    fn missing_reviews_redistribute_to_new_learning() {
        let planner = StudyPlanner::default();
        let plan = planner
            .plan_week(
                &set(&["new", "mid"]),
                &PrerequisiteGraph::new(),
                &masteries(&[("new", 0.1), ("mid", 0.5)]),
                &BTreeSet::new(),
            )
            .unwrap();
        assert_eq!(plan.share(ActivityKind::Review), 0.0);
        assert!((plan.share(ActivityKind::NewLearning) - 0.7).abs() < 1e-6);
        assert!((plan.share(ActivityKind::Practice) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn week_without_new_topics_splits_between_review_and_practice() {
        let planner = StudyPlanner::default();
        let plan = planner
            .plan_week(
                &set(&["mid", "due"]),
                &PrerequisiteGraph::new(),
                &masteries(&[("mid", 0.5), ("due", 0.9)]),
                &set(&["due"]),
            )
            .unwrap();
        assert!((plan.share(ActivityKind::Review) - 0.5).abs() < 1e-6);
        assert!((plan.share(ActivityKind::Practice) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_week_when_nothing_needs_work() {
        let planner = StudyPlanner::default();
        let plan = planner
            .plan_week(&BTreeSet::new(), &PrerequisiteGraph::new(), &MasteryMap::new(), &BTreeSet::new())
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn week_ignores_due_topics_outside_the_plan() {
        let planner = StudyPlanner::default();
        let empty = planner
            .plan_week(&BTreeSet::new(), &PrerequisiteGraph::new(), &MasteryMap::new(), &set(&["ghost"]))
            .unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.total_hours(), 0.0);

        let plan = planner
            .plan_week(
                &set(&["new", "mid"]),
                &PrerequisiteGraph::new(),
                &masteries(&[("new", 0.1), ("mid", 0.5)]),
                &set(&["ghost"]),
            )
            .unwrap();
        assert!(plan.sessions().all(|s| s.topic.as_str() != "ghost"));
        assert_eq!(plan.share(ActivityKind::Review), 0.0);
        assert!((plan.share(ActivityKind::NewLearning) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn new_learning_follows_prerequisites_within_the_week() {
        let planner = StudyPlanner::default();
        let mut graph = PrerequisiteGraph::new();
        graph.add_prerequisite("b", "a");
        let plan = planner
            .plan_week(
                &set(&["a", "b"]),
                &graph,
                &masteries(&[("a", 0.3), ("b", 0.0)]),
                &BTreeSet::new(),
            )
            .unwrap();
        let first_b = plan.sessions().position(|s| s.topic.as_str() == "b").unwrap();
        let last_a = plan
            .sessions()
            .enumerate()
            .filter(|(_, s)| s.topic.as_str() == "a")
            .map(|(i, _)| i)
            .max()
            .unwrap();
        assert!(first_b > last_a);
    }
}
