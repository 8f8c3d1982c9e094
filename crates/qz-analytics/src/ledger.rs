//! Performance ledger: the store object that turns a learner's raw event
//! stream into session summaries and per-question statistics.
//!
//! One ledger instance is created at service start and handed to whatever
//! layer ingests quiz submissions. Learners never share mutable state with
//! each other; everything is keyed by learner identifier.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::event::{AnswerRecord, LearnerEvent};

/// Gap between consecutive events that closes a session, in seconds.
pub const SESSION_GAP_SECS: i64 = 3600;

/// How many of a learner's most recent sessions are summarized.
pub const MAX_RECENT_SESSIONS: usize = 10;

/// How many recent session accuracies feed the improvement estimate.
const IMPROVEMENT_WINDOW: usize = 3;

/// Aggregate statistics for one distinct question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionStats {
    /// Total times the question was attempted
    pub attempts: u32,
    /// Attempts graded correct
    pub correct: u32,
    /// Running average response time in seconds; None until a timed attempt
    pub average_time: Option<f64>,
    /// Frequency of each incorrect free-text answer
    pub common_mistakes: BTreeMap<String, u32>,
    /// When the question was last attempted; drives stale-entry eviction
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl QuestionStats {
    fn record(&mut self, answer: &AnswerRecord, at: DateTime<Utc>) {
        self.attempts += 1;
        self.last_attempt_at = Some(at);

        if answer.is_correct {
            self.correct += 1;
        } else if let Some(wrong) = answer.user_answer.as_deref()
            && !wrong.is_empty()
        {
            *self.common_mistakes.entry(wrong.to_string()).or_insert(0) += 1;
        }

        if let Some(time_taken) = answer.time_taken {
            // Incremental mean over the attempt count. The first timed
            // observation becomes the average directly, so the update never
            // divides by zero.
            self.average_time = Some(match self.average_time {
                None => time_taken,
                Some(average) => {
                    let n = f64::from(self.attempts);
                    (average * (n - 1.0) + time_taken) / n
                }
            });
        }
    }

    /// Share of attempts graded correct, 0.0 with no attempts.
    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.attempts)
    }
}

/// Immutable summary of one contiguous study session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Timestamp of the first event in the session
    pub started_at: DateTime<Utc>,
    /// Timestamp of the last event in the session
    pub ended_at: DateTime<Utc>,
    /// Answers submitted during the session
    pub questions_answered: u32,
    /// Answers graded correct
    pub correct_answers: u32,
    /// Overall accuracy, 0.0 for a session with no answers
    pub accuracy: f64,
    /// Per-topic accuracy observed in the session
    pub topic_performance: BTreeMap<String, f64>,
    /// Per-bloom-level accuracy observed in the session
    pub bloom_performance: BTreeMap<String, f64>,
}

/// Aggregate view of a learner's recent history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerAnalytics {
    pub learner_id: String,
    pub total_sessions: usize,
    pub total_questions_attempted: u32,
    pub total_correct: u32,
    pub overall_accuracy: f64,
    /// Mean per-session accuracy for each topic
    pub topic_mastery: BTreeMap<String, f64>,
    /// Per-session accuracy in chronological order
    pub learning_curve: Vec<LearningPoint>,
    /// Total in-session time across the recent sessions, in seconds
    pub total_study_time_secs: i64,
    pub average_session_time_secs: f64,
    /// Mean of the last few session accuracies minus the first
    pub improvement: f64,
    pub last_activity: DateTime<Utc>,
    /// Topics with the highest aggregated accuracy, best first
    pub strengths: Vec<(String, f64)>,
    /// Topics with the lowest aggregated accuracy, worst first
    pub weaknesses: Vec<(String, f64)>,
}

/// One point on a learner's accuracy-over-time curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPoint {
    pub at: DateTime<Utc>,
    pub accuracy: f64,
}

/// In-memory event log and question statistics, keyed by learner and
/// question identifiers.
#[derive(Debug, Default)]
pub struct PerformanceLedger {
    events: HashMap<String, Vec<LearnerEvent>>,
    question_stats: HashMap<String, QuestionStats>,
}

impl PerformanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a graded answer at the current time.
    pub fn record_answer(&mut self, learner_id: &str, question_id: &str, answer: &AnswerRecord) {
        self.record_answer_at(learner_id, question_id, answer, Utc::now());
    }

    /// Record a graded answer with an explicit timestamp.
    ///
    /// Events are appended in call order; the session partitioning below
    /// scans them in that order, so callers replaying history must replay
    /// chronologically.
    pub fn record_answer_at(
        &mut self,
        learner_id: &str,
        question_id: &str,
        answer: &AnswerRecord,
        at: DateTime<Utc>,
    ) {
        self.question_stats
            .entry(question_id.to_string())
            .or_default()
            .record(answer, at);

        self.events
            .entry(learner_id.to_string())
            .or_default()
            .push(LearnerEvent::AnswerSubmitted {
                at,
                question_id: question_id.to_string(),
                answer: answer.clone(),
            });
    }

    /// Record that a quiz was generated for the learner at the current time.
    pub fn record_quiz_generation(&mut self, learner_id: &str, metadata: serde_json::Value) {
        self.record_quiz_generation_at(learner_id, metadata, Utc::now());
    }

    /// Record a quiz generation with an explicit timestamp.
    pub fn record_quiz_generation_at(
        &mut self,
        learner_id: &str,
        metadata: serde_json::Value,
        at: DateTime<Utc>,
    ) {
        self.events
            .entry(learner_id.to_string())
            .or_default()
            .push(LearnerEvent::QuizGenerated { at, metadata });
        tracing::debug!("tracked quiz generation for learner {learner_id}");
    }

    /// Statistics for one question, if it has ever been attempted.
    pub fn question_stats(&self, question_id: &str) -> Option<&QuestionStats> {
        self.question_stats.get(question_id)
    }

    /// Summarize the learner's recent sessions, most-recent-last.
    ///
    /// Events are partitioned in a single chronological pass: a new session
    /// starts whenever the gap between consecutive events exceeds
    /// [`SESSION_GAP_SECS`]. At most [`MAX_RECENT_SESSIONS`] summaries are
    /// returned.
    pub fn recent_sessions(&self, learner_id: &str) -> Vec<SessionSummary> {
        let Some(events) = self.events.get(learner_id) else {
            return Vec::new();
        };

        let mut sessions = Vec::new();
        let mut current: Vec<&LearnerEvent> = Vec::new();
        let mut last_at: Option<DateTime<Utc>> = None;

        for event in events {
            if let Some(last) = last_at
                && (event.at() - last).num_seconds() > SESSION_GAP_SECS
                && !current.is_empty()
            {
                sessions.push(summarize(&current));
                current.clear();
            }
            current.push(event);
            last_at = Some(event.at());
        }
        if !current.is_empty() {
            sessions.push(summarize(&current));
        }

        if sessions.len() > MAX_RECENT_SESSIONS {
            sessions.split_off(sessions.len() - MAX_RECENT_SESSIONS)
        } else {
            sessions
        }
    }

    /// Aggregate a learner's recent history into a single analytics view.
    ///
    /// This is the one query that refuses to fabricate a default: a learner
    /// with no recorded sessions yields [`EngineError::InsufficientData`]
    /// so callers can distinguish "never studied" from "studied badly".
    pub fn learner_analytics(&self, learner_id: &str) -> Result<LearnerAnalytics, EngineError> {
        let sessions = self.recent_sessions(learner_id);
        if sessions.is_empty() {
            return Err(EngineError::InsufficientData(format!(
                "no recorded sessions for learner {learner_id}"
            )));
        }

        let total_questions: u32 = sessions.iter().map(|s| s.questions_answered).sum();
        let total_correct: u32 = sessions.iter().map(|s| s.correct_answers).sum();
        let overall_accuracy = if total_questions > 0 {
            f64::from(total_correct) / f64::from(total_questions)
        } else {
            0.0
        };

        // Mean of the per-session topic accuracies.
        let mut topic_totals: BTreeMap<String, (f64, u32)> = BTreeMap::new();
        for session in &sessions {
            for (topic, score) in &session.topic_performance {
                let entry = topic_totals.entry(topic.clone()).or_insert((0.0, 0));
                entry.0 += score;
                entry.1 += 1;
            }
        }
        let topic_mastery: BTreeMap<String, f64> = topic_totals
            .into_iter()
            .map(|(topic, (sum, count))| (topic, sum / f64::from(count)))
            .collect();

        let learning_curve: Vec<LearningPoint> = sessions
            .iter()
            .map(|s| LearningPoint {
                at: s.started_at,
                accuracy: s.accuracy,
            })
            .collect();

        let total_study_time_secs: i64 = sessions
            .iter()
            .map(|s| (s.ended_at - s.started_at).num_seconds())
            .sum();

        let improvement = if sessions.len() >= 2 {
            let recent: Vec<f64> = sessions
                .iter()
                .rev()
                .take(IMPROVEMENT_WINDOW)
                .map(|s| s.accuracy)
                .collect();
            crate::stats::mean(&recent) - sessions[0].accuracy
        } else {
            0.0
        };

        let mut ranked: Vec<(String, f64)> = topic_mastery
            .iter()
            .map(|(topic, score)| (topic.clone(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let strengths: Vec<(String, f64)> = ranked.iter().take(3).cloned().collect();
        let weaknesses: Vec<(String, f64)> = ranked.iter().rev().take(3).cloned().collect();

        Ok(LearnerAnalytics {
            learner_id: learner_id.to_string(),
            total_sessions: sessions.len(),
            total_questions_attempted: total_questions,
            total_correct,
            overall_accuracy,
            topic_mastery,
            learning_curve,
            total_study_time_secs,
            average_session_time_secs: total_study_time_secs as f64 / sessions.len() as f64,
            improvement,
            last_activity: sessions[sessions.len() - 1].ended_at,
            strengths,
            weaknesses,
        })
    }

    /// Clone a learner's raw event log for external durability.
    pub fn export_events(&self, learner_id: &str) -> Vec<LearnerEvent> {
        self.events.get(learner_id).cloned().unwrap_or_default()
    }

    /// Replace a learner's event log from a previous export.
    ///
    /// Question statistics are not rebuilt from imported events; they track
    /// live submissions only.
    pub fn import_events(
        &mut self,
        learner_id: &str,
        events: Vec<LearnerEvent>,
    ) -> Result<(), EngineError> {
        if learner_id.is_empty() {
            return Err(EngineError::Validation(
                "learner id must not be empty".to_string(),
            ));
        }
        self.events.insert(learner_id.to_string(), events);
        tracing::info!("imported event history for learner {learner_id}");
        Ok(())
    }

    /// Drop question statistics beyond the `max_entries` most recently
    /// attempted, returning how many were evicted.
    ///
    /// The ledger never evicts on its own; the embedding service calls this
    /// from whatever maintenance cadence it runs.
    pub fn evict_stale_question_stats(&mut self, max_entries: usize) -> usize {
        if self.question_stats.len() <= max_entries {
            return 0;
        }

        let mut by_recency: Vec<(String, Option<DateTime<Utc>>)> = self
            .question_stats
            .iter()
            .map(|(id, stats)| (id.clone(), stats.last_attempt_at))
            .collect();
        by_recency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let stale = by_recency.split_off(max_entries);
        for (question_id, _) in &stale {
            self.question_stats.remove(question_id);
        }
        tracing::info!(
            "evicted {} stale question statistics entries",
            stale.len()
        );
        stale.len()
    }

    /// Number of questions with recorded statistics.
    pub fn tracked_questions(&self) -> usize {
        self.question_stats.len()
    }
}

fn summarize(events: &[&LearnerEvent]) -> SessionSummary {
    let mut questions_answered = 0u32;
    let mut correct_answers = 0u32;
    let mut topic_counts: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    let mut bloom_counts: BTreeMap<String, (u32, u32)> = BTreeMap::new();

    for event in events {
        let LearnerEvent::AnswerSubmitted { answer, .. } = event else {
            continue;
        };
        questions_answered += 1;
        if answer.is_correct {
            correct_answers += 1;
        }

        let topic = topic_counts.entry(answer.topic.clone()).or_insert((0, 0));
        topic.1 += 1;
        if answer.is_correct {
            topic.0 += 1;
        }

        let bloom = bloom_counts
            .entry(answer.bloom_level.clone())
            .or_insert((0, 0));
        bloom.1 += 1;
        if answer.is_correct {
            bloom.0 += 1;
        }
    }

    let to_scores = |counts: BTreeMap<String, (u32, u32)>| -> BTreeMap<String, f64> {
        counts
            .into_iter()
            .map(|(key, (correct, total))| {
                let score = if total > 0 {
                    f64::from(correct) / f64::from(total)
                } else {
                    0.0
                };
                (key, score)
            })
            .collect()
    };

    let accuracy = if questions_answered > 0 {
        f64::from(correct_answers) / f64::from(questions_answered)
    } else {
        0.0
    };

    SessionSummary {
        started_at: events[0].at(),
        ended_at: events[events.len() - 1].at(),
        questions_answered,
        correct_answers,
        accuracy,
        topic_performance: to_scores(topic_counts),
        bloom_performance: to_scores(bloom_counts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn answer(correct: bool, topic: &str) -> AnswerRecord {
        AnswerRecord {
            is_correct: correct,
            topic: topic.to_string(),
            ..AnswerRecord::default()
        }
    }

    #[test]
    fn question_stats_track_attempts_and_mistakes() {
        let mut ledger = PerformanceLedger::new();
        let wrong = AnswerRecord {
            is_correct: false,
            user_answer: Some("mitochondria".to_string()),
            ..AnswerRecord::default()
        };
        ledger.record_answer_at("amy", "q1", &wrong, at(0));
        ledger.record_answer_at("amy", "q1", &wrong, at(1));
        ledger.record_answer_at("amy", "q1", &answer(true, "Biology"), at(2));

        let stats = ledger.question_stats("q1").unwrap();
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.correct, 1);
        assert_eq!(stats.common_mistakes.get("mitochondria"), Some(&2));
        assert!((stats.accuracy() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn average_time_adopts_first_observation_then_runs_incremental_mean() {
        let mut ledger = PerformanceLedger::new();
        // Untimed first attempt must not poison the average with a zero.
        ledger.record_answer_at("amy", "q1", &answer(true, "Biology"), at(0));
        let timed = AnswerRecord {
            is_correct: true,
            time_taken: Some(30.0),
            ..AnswerRecord::default()
        };
        ledger.record_answer_at("amy", "q1", &timed, at(1));
        assert_eq!(ledger.question_stats("q1").unwrap().average_time, Some(30.0));

        let timed = AnswerRecord {
            time_taken: Some(60.0),
            ..timed
        };
        ledger.record_answer_at("amy", "q1", &timed, at(2));
        // n = 3 attempts: (30 * 2 + 60) / 3 = 40.
        assert_eq!(ledger.question_stats("q1").unwrap().average_time, Some(40.0));
    }

    #[test]
    fn events_split_into_sessions_on_hour_gaps() {
        let mut ledger = PerformanceLedger::new();
        ledger.record_answer_at("amy", "q1", &answer(true, "Biology"), at(0));
        ledger.record_answer_at("amy", "q2", &answer(false, "Biology"), at(5));
        // 61 minutes later: new session.
        ledger.record_answer_at("amy", "q3", &answer(true, "Chemistry"), at(66));
        ledger.record_answer_at("amy", "q4", &answer(true, "Chemistry"), at(70));

        let sessions = ledger.recent_sessions("amy");
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].questions_answered, 2);
        assert_eq!(sessions[0].accuracy, 0.5);
        assert_eq!(sessions[1].questions_answered, 2);
        assert_eq!(sessions[1].accuracy, 1.0);
        assert_eq!(sessions[1].topic_performance.get("Chemistry"), Some(&1.0));
    }

    #[test]
    fn a_gap_of_exactly_one_hour_stays_in_one_session() {
        let mut ledger = PerformanceLedger::new();
        ledger.record_answer_at("amy", "q1", &answer(true, "Biology"), at(0));
        ledger.record_answer_at("amy", "q2", &answer(true, "Biology"), at(60));
        assert_eq!(ledger.recent_sessions("amy").len(), 1);
    }

    #[test]
    fn recent_sessions_are_capped_most_recent_last() {
        let mut ledger = PerformanceLedger::new();
        for i in 0..12 {
            // Two hours apart, one answer each: twelve sessions.
            ledger.record_answer_at("amy", "q", &answer(i % 2 == 0, "General"), at(i * 120));
        }
        let sessions = ledger.recent_sessions("amy");
        assert_eq!(sessions.len(), MAX_RECENT_SESSIONS);
        // The two oldest sessions fell off the front.
        assert_eq!(sessions[0].started_at, at(2 * 120));
        assert_eq!(sessions[sessions.len() - 1].started_at, at(11 * 120));
    }

    #[test]
    fn quiz_generation_events_extend_sessions_without_counting_as_answers() {
        let mut ledger = PerformanceLedger::new();
        ledger.record_quiz_generation_at("amy", serde_json::json!({"n": 5}), at(0));
        ledger.record_answer_at("amy", "q1", &answer(true, "Biology"), at(3));

        let sessions = ledger.recent_sessions("amy");
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].questions_answered, 1);
        assert_eq!(sessions[0].started_at, at(0));
        assert_eq!(sessions[0].ended_at, at(3));
    }

    #[test]
    fn learner_analytics_aggregates_history() {
        let mut ledger = PerformanceLedger::new();
        ledger.record_answer_at("amy", "q1", &answer(true, "Biology"), at(0));
        ledger.record_answer_at("amy", "q2", &answer(true, "Biology"), at(5));
        ledger.record_answer_at("amy", "q3", &answer(false, "Chemistry"), at(130));
        ledger.record_answer_at("amy", "q4", &answer(true, "Chemistry"), at(135));

        let analytics = ledger.learner_analytics("amy").unwrap();
        assert_eq!(analytics.total_sessions, 2);
        assert_eq!(analytics.total_questions_attempted, 4);
        assert_eq!(analytics.total_correct, 3);
        assert_eq!(analytics.overall_accuracy, 0.75);
        assert_eq!(analytics.topic_mastery.get("Biology"), Some(&1.0));
        assert_eq!(analytics.topic_mastery.get("Chemistry"), Some(&0.5));
        assert_eq!(analytics.learning_curve.len(), 2);
        assert_eq!(analytics.last_activity, at(135));
        assert_eq!(analytics.strengths[0].0, "Biology");
        assert_eq!(analytics.weaknesses[0].0, "Chemistry");
    }

    #[test]
    fn learner_analytics_without_history_is_an_error() {
        let ledger = PerformanceLedger::new();
        assert!(matches!(
            ledger.learner_analytics("nobody"),
            Err(EngineError::InsufficientData(_))
        ));
    }

    #[test]
    fn event_round_trip_preserves_sessions() {
        let mut ledger = PerformanceLedger::new();
        ledger.record_answer_at("amy", "q1", &answer(true, "Biology"), at(0));
        ledger.record_answer_at("amy", "q2", &answer(false, "Biology"), at(5));

        let exported = ledger.export_events("amy");
        let mut restored = PerformanceLedger::new();
        restored.import_events("amy", exported).unwrap();
        assert_eq!(
            restored.recent_sessions("amy")[0].questions_answered,
            ledger.recent_sessions("amy")[0].questions_answered
        );

        assert!(restored.import_events("", Vec::new()).is_err());
    }

    #[test]
    fn eviction_keeps_most_recently_attempted_questions() {
        let mut ledger = PerformanceLedger::new();
        for i in 0..5 {
            ledger.record_answer_at("amy", &format!("q{i}"), &answer(true, "General"), at(i));
        }
        assert_eq!(ledger.evict_stale_question_stats(5), 0);
        assert_eq!(ledger.evict_stale_question_stats(2), 3);
        assert_eq!(ledger.tracked_questions(), 2);
        assert!(ledger.question_stats("q4").is_some());
        assert!(ledger.question_stats("q3").is_some());
        assert!(ledger.question_stats("q0").is_none());
    }
}
