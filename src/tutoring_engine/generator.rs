use std::fmt;

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::tutoring_engine::{
    bank::QuestionBank,
    config::QuizConfig,
    error::{Result, TutorError},
    helpers,
    models::{
        check_unit_interval, BloomLevel, Difficulty, GeneratedContent, PromptRequest, Question,
        QuestionSource, TopicId,
    },
    state::StudentState,
    student_model::StudentModel,
};

/// External collaborator that writes question prose.
///
/// Its output is untrusted: the quiz generator validates every reply and
/// retries within its attempt budget. Timeouts belong to the implementation.
pub trait QuestionTextGenerator {
    type Error: fmt::Display;

    fn generate(&mut self, request: &PromptRequest) -> std::result::Result<GeneratedContent, Self::Error>;
}

impl<F, E> QuestionTextGenerator for F
where
    F: FnMut(&PromptRequest) -> std::result::Result<GeneratedContent, E>,
    E: fmt::Display,
{
    type Error = E;

    fn generate(&mut self, request: &PromptRequest) -> std::result::Result<GeneratedContent, E> {
        self(request)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRequest {
    pub topic: TopicId,
    pub count: usize,
    /// Current mastery estimate for `topic`.
    pub mastery: f64,
    /// Fixes question ids and bank picks; `None` draws from entropy.
    pub rng_seed: Option<u64>,
}

impl QuizRequest {
    pub fn new(topic: impl Into<TopicId>, count: usize, mastery: f64) -> Self {
        QuizRequest {
            topic: topic.into(),
            count,
            mastery,
            rng_seed: None,
        }
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

/// Zone-of-proximal-development mapping from mastery to difficulty.
pub fn recommend_difficulty(mastery: f64, config: &QuizConfig) -> Result<Difficulty> {
    let mastery = check_unit_interval("mastery", mastery)?;
    Ok(if mastery < config.easy_below {
        Difficulty::Easy
    } else if mastery <= config.hard_above {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    })
}

/// Primary Bloom level for a difficulty.
pub fn bloom_level_for_difficulty(difficulty: Difficulty) -> BloomLevel {
    difficulty.bloom_band()[0]
}

pub struct QuizGenerator<G> {
    generator: G,
    bank: Option<QuestionBank>,
    config: QuizConfig,
}

impl<G: QuestionTextGenerator> QuizGenerator<G> {
    pub fn new(generator: G, config: QuizConfig) -> Self {
        QuizGenerator { generator, bank: None, config }
    }

    /// Fall back to `bank` when the generator keeps failing.
    pub fn with_bank(mut self, bank: QuestionBank) -> Self {
        self.bank = Some(bank);
        self
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn recommend_difficulty(&self, mastery: f64) -> Result<Difficulty> {
        recommend_difficulty(mastery, &self.config)
    }

    pub fn generate_quiz(&mut self, topic: &TopicId, n: usize, mastery: f64) -> Result<Vec<Question>> {
        self.generate(&QuizRequest::new(topic.clone(), n, mastery))
    }

    /// Quiz sized to `n` at the learner's current estimate for `topic`.
    pub fn quiz_for(
        &mut self,
        model: &StudentModel,
        state: &StudentState,
        topic: &TopicId,
        n: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<Question>> {
        let mastery = model.estimate_mastery(state, topic, now);
        self.generate(&QuizRequest::new(topic.clone(), n, mastery))
    }

    /// Exactly `request.count` questions, or an error and no questions.
    pub fn generate(&mut self, request: &QuizRequest) -> Result<Vec<Question>> {
        if request.count == 0 {
            return Err(TutorError::Validation("quiz must contain at least one question".into()));
        }
        let difficulty = self.recommend_difficulty(request.mastery)?;
        let mut rng: StdRng = match request.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        (0..request.count)
            .map(|slot| {
                let prompt = PromptRequest {
                    topic: request.topic.clone(),
                    difficulty,
                    bloom_level: helpers::bloom_for_slot(difficulty, slot),
                };
                self.question_for(prompt, request.mastery, &mut rng)
            })
            .collect()
    }

    fn question_for(&mut self, prompt: PromptRequest, mastery: f64, rng: &mut StdRng) -> Result<Question> {
        let attempts = self.config.generator_attempts;
        let mut reason = String::new();

        for attempt in 1..=attempts {
            match self.generator.generate(&prompt) {
                Ok(content) => match helpers::validate_content(&content) {
                    Ok(()) => {
                        let id = helpers::question_id(&prompt.topic, rng);
                        return Ok(helpers::question(id, &prompt, content, QuestionSource::Generated, mastery));
                    }
                    Err(why) => {
                        warn!(topic = %prompt.topic, attempt, reason = %why, "rejected generator output");
                        reason = why;
                    }
                },
                Err(err) => {
                    warn!(topic = %prompt.topic, attempt, error = %err, "question generator call failed");
                    reason = err.to_string();
                }
            }
        }

        if let Some((bloom_level, content)) = self.bank.as_ref().and_then(|b| b.pick(&prompt, &mut *rng)) {
            info!(topic = %prompt.topic, difficulty = %prompt.difficulty, "using question bank");
            let prompt = PromptRequest { bloom_level, ..prompt };
            let id = helpers::question_id(&prompt.topic, rng);
            return Ok(helpers::question(id, &prompt, content, QuestionSource::Bank, mastery));
        }

        Err(TutorError::Generator {
            topic: prompt.topic,
            attempts,
            reason,
        })
    }
}
