//! Profile updater: folds session summaries and quiz reports into a
//! learner profile with recency-weighted exponential averaging.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use qz_analytics::{QuizReport, SessionSummary, stats};

use crate::profile::LearnerProfile;

/// (old, new) blend weights for incremental per-session updates.
pub const SESSION_WEIGHTS: (f64, f64) = (0.7, 0.3);

/// (old, new) blend weights for whole-quiz-report updates. Quiz completions
/// carry more weight than individual session fragments; the asymmetry with
/// [`SESSION_WEIGHTS`] is intentional.
pub const REPORT_WEIGHTS: (f64, f64) = (0.6, 0.4);

/// (old, new) blend weights for the average-time estimate.
pub const TIME_WEIGHTS: (f64, f64) = (0.7, 0.3);

/// Fold a single session summary into the profile.
///
/// Topic and bloom observations blend at [`SESSION_WEIGHTS`]; a key seen
/// for the first time adopts the observed score directly. Learning velocity
/// and the derived lists are left to [`apply_sessions`], which sees the
/// whole recent series.
pub fn apply_session(profile: &mut LearnerProfile, session: &SessionSummary) {
    profile.total_questions_answered += u64::from(session.questions_answered);
    profile.correct_answers += u64::from(session.correct_answers);

    blend_all(
        &mut profile.topics_mastery,
        &session.topic_performance,
        SESSION_WEIGHTS,
    );
    blend_all(
        &mut profile.bloom_performance,
        &session.bloom_performance,
        SESSION_WEIGHTS,
    );
}

/// Fold an ordered run of recent session summaries into the profile and
/// refresh everything derived from them.
///
/// Learning velocity is the least-squares slope over the sessions' accuracy
/// series; fewer than two sessions have no trend and leave it at zero.
pub fn apply_sessions(
    profile: &mut LearnerProfile,
    sessions: &[SessionSummary],
    at: DateTime<Utc>,
) {
    for session in sessions {
        apply_session(profile, session);
    }

    if profile.total_questions_answered > 0 {
        profile.learning_velocity = learning_velocity(sessions);
    }
    profile.refresh_strengths_weaknesses();
    profile.last_session = Some(at);

    tracing::debug!(
        "folded {} sessions into profile for learner {}",
        sessions.len(),
        profile.learner_id
    );
}

/// Fold a completed quiz report into the profile.
pub fn apply_quiz_report(profile: &mut LearnerProfile, report: &QuizReport, at: DateTime<Utc>) {
    profile.total_questions_answered += u64::from(report.total_questions);
    profile.correct_answers += u64::from(report.correct_answers);

    blend_all(
        &mut profile.topics_mastery,
        &report.topic_scores,
        REPORT_WEIGHTS,
    );
    blend_all(
        &mut profile.bloom_performance,
        &report.bloom_scores,
        REPORT_WEIGHTS,
    );

    if let Some(average_time) = report.average_time {
        profile.average_time_per_question = Some(match profile.average_time_per_question {
            None => average_time,
            Some(prior) => TIME_WEIGHTS.0 * prior + TIME_WEIGHTS.1 * average_time,
        });
    }

    profile.refresh_strengths_weaknesses();
    profile.last_session = Some(at);

    tracing::info!(
        "updated model for learner {} from quiz {}",
        profile.learner_id,
        report.quiz_id
    );
}

/// Slope of the accuracy series across the given sessions, in order.
pub fn learning_velocity(sessions: &[SessionSummary]) -> f64 {
    if sessions.len() < 2 {
        return 0.0;
    }
    let accuracies: Vec<f64> = sessions.iter().map(|s| s.accuracy).collect();
    stats::linear_slope(&accuracies)
}

/// Blend every observation into the target map: absent keys adopt the
/// observation, present keys take `weights.0 * old + weights.1 * observed`.
/// Both inputs live in [0, 1], so the convex blend stays there.
fn blend_all(
    target: &mut BTreeMap<String, f64>,
    observed: &BTreeMap<String, f64>,
    weights: (f64, f64),
) {
    for (key, value) in observed {
        target
            .entry(key.clone())
            .and_modify(|current| *current = weights.0 * *current + weights.1 * value)
            .or_insert(*value);
    }
}
