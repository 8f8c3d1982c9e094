//! Learner profiles: the per-learner belief state every adaptive decision
//! reads from, plus the flat snapshot record used for persistence.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use qz_analytics::EngineError;

/// Mastery above which a topic counts as a strength.
const STRENGTH_THRESHOLD: f64 = 0.7;

/// Mastery below which a topic counts as a weakness.
pub(crate) const WEAKNESS_THRESHOLD: f64 = 0.6;

/// How many strengths and weaknesses are kept on the profile.
const RANKED_TOPIC_LIMIT: usize = 3;

/// Coarse classification of a learner's overall accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Struggling,
    Developing,
    Proficient,
    Advanced,
}

/// Minimum accuracy per level, checked top-down; the first satisfied floor
/// wins and anything below the last entry is `Struggling`. Kept as an
/// explicit table so the ordering cannot silently drift.
const LEVEL_FLOORS: [(PerformanceLevel, f64); 3] = [
    (PerformanceLevel::Advanced, 0.95),
    (PerformanceLevel::Proficient, 0.8),
    (PerformanceLevel::Developing, 0.6),
];

/// A learner's accumulated performance state.
///
/// Mastery and bloom scores stay within [0, 1]: they are only ever written
/// as convex blends of prior values and observed accuracies. A topic absent
/// from `topics_mastery` is unknown, not zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerProfile {
    /// Stable learner identifier
    pub learner_id: String,
    /// Lifetime answered-question count; never decreases
    pub total_questions_answered: u64,
    /// Lifetime correct-answer count; never exceeds the total
    pub correct_answers: u64,
    /// Estimated mastery per topic, in [0, 1]
    pub topics_mastery: BTreeMap<String, f64>,
    /// Performance per Bloom's taxonomy level, in [0, 1]
    pub bloom_performance: BTreeMap<String, f64>,
    /// Recency-weighted seconds per question; None until timing data arrives
    pub average_time_per_question: Option<f64>,
    /// Signed accuracy trend over recent sessions; positive means improving
    pub learning_velocity: f64,
    /// When the profile last absorbed new results
    pub last_session: Option<DateTime<Utc>>,
    /// Topics with the highest mastery, best first (derived)
    pub strengths: Vec<String>,
    /// Topics with the lowest mastery (derived)
    pub weaknesses: Vec<String>,
    /// Question types the learner engages with best
    pub preferred_question_types: Vec<String>,
}

impl LearnerProfile {
    /// Fresh profile with no recorded history.
    pub fn new(learner_id: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            total_questions_answered: 0,
            correct_answers: 0,
            topics_mastery: BTreeMap::new(),
            bloom_performance: BTreeMap::new(),
            average_time_per_question: None,
            learning_velocity: 0.0,
            last_session: None,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            preferred_question_types: Vec::new(),
        }
    }

    /// Lifetime accuracy, 0.0 before any questions are answered.
    pub fn accuracy(&self) -> f64 {
        if self.total_questions_answered == 0 {
            return 0.0;
        }
        self.correct_answers as f64 / self.total_questions_answered as f64
    }

    /// Classify overall performance from lifetime accuracy.
    ///
    /// A learner with no answered questions classifies as `Developing`: new
    /// learners get the middle-of-the-road quiz mix rather than the
    /// remedial one.
    pub fn performance_level(&self) -> PerformanceLevel {
        if self.total_questions_answered == 0 {
            return PerformanceLevel::Developing;
        }
        let accuracy = self.accuracy();
        for (level, floor) in LEVEL_FLOORS {
            if accuracy >= floor {
                return level;
            }
        }
        PerformanceLevel::Struggling
    }

    /// Recompute the derived strength/weakness lists from topic mastery.
    ///
    /// Topics are ranked by mastery descending (ties broken by name so the
    /// output is deterministic). Strengths are the top entries above 0.7;
    /// weaknesses come from the trailing entries of the same ranking, below
    /// 0.6.
    pub fn refresh_strengths_weaknesses(&mut self) {
        if self.topics_mastery.is_empty() {
            return;
        }

        let mut ranked: Vec<(&String, f64)> = self
            .topics_mastery
            .iter()
            .map(|(topic, mastery)| (topic, *mastery))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        self.strengths = ranked
            .iter()
            .take(RANKED_TOPIC_LIMIT)
            .filter(|(_, mastery)| *mastery > STRENGTH_THRESHOLD)
            .map(|(topic, _)| (*topic).clone())
            .collect();

        let tail_start = ranked.len().saturating_sub(RANKED_TOPIC_LIMIT);
        self.weaknesses = ranked[tail_start..]
            .iter()
            .filter(|(_, mastery)| *mastery < WEAKNESS_THRESHOLD)
            .map(|(topic, _)| (*topic).clone())
            .collect();
    }

    /// Flatten the profile into its persistence record.
    pub fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            learner_id: self.learner_id.clone(),
            total_questions_answered: self.total_questions_answered,
            correct_answers: self.correct_answers,
            accuracy: self.accuracy(),
            performance_level: self.performance_level(),
            topics_mastery: self.topics_mastery.clone(),
            bloom_performance: self.bloom_performance.clone(),
            average_time_per_question: self.average_time_per_question,
            learning_velocity: self.learning_velocity,
            last_session: self.last_session,
            strengths: self.strengths.clone(),
            weaknesses: self.weaknesses.clone(),
            preferred_question_types: self.preferred_question_types.clone(),
        }
    }
}

/// Flat, serializable form of a [`LearnerProfile`] for durability outside
/// the core. Carries the derived accuracy and performance level so readers
/// of the stored record do not need the classification logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub learner_id: String,
    pub total_questions_answered: u64,
    pub correct_answers: u64,
    /// Derived at export time
    pub accuracy: f64,
    /// Derived at export time
    pub performance_level: PerformanceLevel,
    pub topics_mastery: BTreeMap<String, f64>,
    pub bloom_performance: BTreeMap<String, f64>,
    pub average_time_per_question: Option<f64>,
    pub learning_velocity: f64,
    /// RFC 3339 timestamp when serialized; lossless to the second
    pub last_session: Option<DateTime<Utc>>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub preferred_question_types: Vec<String>,
}

impl ProfileSnapshot {
    /// Rebuild a live profile from a stored snapshot.
    ///
    /// The learner identifier is the one hard requirement; the derived
    /// fields are recomputed on the next update rather than trusted.
    pub fn into_profile(self) -> Result<LearnerProfile, EngineError> {
        if self.learner_id.is_empty() {
            return Err(EngineError::Validation(
                "profile snapshot is missing a learner id".to_string(),
            ));
        }
        Ok(LearnerProfile {
            learner_id: self.learner_id,
            total_questions_answered: self.total_questions_answered,
            correct_answers: self.correct_answers,
            topics_mastery: self.topics_mastery,
            bloom_performance: self.bloom_performance,
            average_time_per_question: self.average_time_per_question,
            learning_velocity: self.learning_velocity,
            last_session: self.last_session,
            strengths: self.strengths,
            weaknesses: self.weaknesses,
            preferred_question_types: self.preferred_question_types,
        })
    }
}
