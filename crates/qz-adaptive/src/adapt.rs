//! Adaptive configurator: turns a base quiz configuration plus a learner
//! profile into an adjusted configuration.

use chrono::{DateTime, Utc};

use crate::config::{MAX_QUESTIONS, MIN_QUESTIONS, QuizConfig};
use crate::profile::{LearnerProfile, PerformanceLevel, WEAKNESS_THRESHOLD};
use crate::schedule;

/// Bloom-level performance below which that level's weight gets boosted.
const WEAK_BLOOM_THRESHOLD: f64 = 0.5;

/// Boost factor applied to weak bloom levels before renormalization.
const WEAK_BLOOM_BOOST: f64 = 1.2;

/// Priority assigned to topics selected for spaced review.
const SPACED_REVIEW_PRIORITY: f64 = 0.5;

/// How many focus topics a configuration carries.
const MAX_FOCUS_TOPICS: usize = 5;

/// Seconds per question above which the learner is likely fatiguing.
const SLOW_ANSWER_SECS: f64 = 120.0;

/// Seconds per question below which the learner has headroom for more.
const FAST_ANSWER_SECS: f64 = 30.0;

/// Velocity magnitude beyond which the question count reacts.
const VELOCITY_THRESHOLD: f64 = 0.1;

/// Adjust a base configuration to the learner's current state.
///
/// Steps run in a fixed order (difficulty distribution, then focus topics,
/// then question count, then question type weighting), each reading only
/// the profile and the configuration. `today` anchors the spaced-review
/// due check.
pub fn adapt_config(
    mut config: QuizConfig,
    profile: &LearnerProfile,
    today: DateTime<Utc>,
) -> QuizConfig {
    let level = profile.performance_level();

    adjust_difficulty_distribution(&mut config, level, profile);
    select_focus_topics(&mut config, profile, today);
    adjust_question_count(&mut config, profile);
    weight_question_types(&mut config, profile);

    tracing::info!(
        "adapted config for learner {}: {:?}, {} questions, focus on {:?}",
        profile.learner_id,
        level,
        config.num_questions,
        config.focus_topics
    );
    config
}

/// Base weight per bloom level for each performance level. Struggling
/// learners get recall-heavy quizzes; advanced learners get the full
/// higher-order mix.
fn base_distribution(level: PerformanceLevel) -> &'static [(&'static str, f64)] {
    match level {
        PerformanceLevel::Struggling => &[
            ("remember", 0.4),
            ("understand", 0.4),
            ("apply", 0.15),
            ("analyze", 0.05),
        ],
        PerformanceLevel::Developing => &[
            ("remember", 0.25),
            ("understand", 0.35),
            ("apply", 0.25),
            ("analyze", 0.15),
        ],
        PerformanceLevel::Proficient => &[
            ("remember", 0.15),
            ("understand", 0.25),
            ("apply", 0.35),
            ("analyze", 0.25),
        ],
        PerformanceLevel::Advanced => &[
            ("remember", 0.05),
            ("understand", 0.15),
            ("apply", 0.30),
            ("analyze", 0.30),
            ("evaluate", 0.10),
            ("create", 0.10),
        ],
    }
}

fn adjust_difficulty_distribution(
    config: &mut QuizConfig,
    level: PerformanceLevel,
    profile: &LearnerProfile,
) {
    config.difficulty_distribution = base_distribution(level)
        .iter()
        .map(|(bloom, weight)| (bloom.to_string(), *weight))
        .collect();

    // Weak bloom levels get extra practice weight. The boost runs before
    // normalization so the whole distribution still sums to one.
    for (bloom, performance) in &profile.bloom_performance {
        if *performance < WEAK_BLOOM_THRESHOLD
            && let Some(weight) = config.difficulty_distribution.get_mut(bloom)
        {
            *weight *= WEAK_BLOOM_BOOST;
        }
    }

    let total: f64 = config.difficulty_distribution.values().sum();
    if total > 0.0 {
        for weight in config.difficulty_distribution.values_mut() {
            *weight /= total;
        }
    }
}

fn select_focus_topics(config: &mut QuizConfig, profile: &LearnerProfile, today: DateTime<Utc>) {
    // Weak topics first, prioritized by how far below mastery they sit.
    let mut candidates: Vec<(String, f64)> = profile
        .topics_mastery
        .iter()
        .filter(|(_, mastery)| **mastery < WEAKNESS_THRESHOLD)
        .map(|(topic, mastery)| (topic.clone(), 1.0 - mastery))
        .collect();

    // Then topics whose spaced-review interval has elapsed. A topic can
    // appear under both reasons; the duplicate survives selection and the
    // quiz generator treats it as emphasis.
    for topic in schedule::due_topics(profile, today) {
        candidates.push((topic, SPACED_REVIEW_PRIORITY));
    }

    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    config.focus_topics = candidates
        .into_iter()
        .take(MAX_FOCUS_TOPICS)
        .map(|(topic, _)| topic)
        .collect();
}

fn adjust_question_count(config: &mut QuizConfig, profile: &LearnerProfile) {
    let mut count = config.num_questions;

    // Timing: slow answering shortens the quiz, quick answering grows it.
    if let Some(average_time) = profile.average_time_per_question {
        if average_time > SLOW_ANSWER_SECS {
            count = count.saturating_sub(2).max(MIN_QUESTIONS);
        } else if average_time < FAST_ANSWER_SECS {
            count = (count + 2).min(MAX_QUESTIONS);
        }
    }

    // Velocity: both adjustments apply in sequence, so a quick improving
    // learner gets the sum of the two bumps.
    if profile.learning_velocity > VELOCITY_THRESHOLD {
        count = (count + 3).min(MAX_QUESTIONS);
    } else if profile.learning_velocity < -VELOCITY_THRESHOLD {
        count = count.saturating_sub(3).max(MIN_QUESTIONS);
    }

    config.num_questions = count;
}

/// Emit each requested question type twice when the learner prefers it,
/// once otherwise. A frequency weighting for the question picker, not a
/// probability distribution.
fn weight_question_types(config: &mut QuizConfig, profile: &LearnerProfile) {
    let mut weighted = Vec::with_capacity(config.question_types.len() * 2);
    for question_type in &config.question_types {
        weighted.push(question_type.clone());
        if profile.preferred_question_types.contains(question_type) {
            weighted.push(question_type.clone());
        }
    }
    config.question_types = weighted;
}
