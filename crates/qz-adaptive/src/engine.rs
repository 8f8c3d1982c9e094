//! The adaptive engine facade: profile lifecycle plus the full
//! history-to-configuration pipeline behind one handle.

use chrono::{DateTime, Utc};

use qz_analytics::{EngineError, QuizReport, SessionSummary};

use crate::adapt;
use crate::config::QuizConfig;
use crate::plan::{self, StudyPlan};
use crate::profile::ProfileSnapshot;
use crate::schedule;
use crate::store::ProfileStore;
use crate::update;

/// Personalizes quiz configuration and study scheduling from accumulated
/// learner performance.
///
/// The engine owns a [`ProfileStore`]; everything else it computes is a
/// pure function of one learner's profile, so operations on different
/// learners never interact.
#[derive(Debug, Default)]
pub struct AdaptiveEngine {
    profiles: ProfileStore,
}

impl AdaptiveEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying profile store.
    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Validate a base configuration, fold the learner's recent session
    /// summaries into their profile, and return the adapted configuration.
    pub fn adjust_config(
        &self,
        learner_id: &str,
        config: QuizConfig,
        recent_sessions: &[SessionSummary],
    ) -> Result<QuizConfig, EngineError> {
        self.adjust_config_at(learner_id, config, recent_sessions, Utc::now())
    }

    /// [`Self::adjust_config`] with an explicit clock, for callers that
    /// replay history.
    pub fn adjust_config_at(
        &self,
        learner_id: &str,
        config: QuizConfig,
        recent_sessions: &[SessionSummary],
        now: DateTime<Utc>,
    ) -> Result<QuizConfig, EngineError> {
        config.validate()?;
        Ok(self.profiles.with_profile(learner_id, |profile| {
            update::apply_sessions(profile, recent_sessions, now);
            adapt::adapt_config(config, profile, now)
        }))
    }

    /// Fold a completed quiz report into the learner's profile.
    pub fn record_quiz_completion(&self, learner_id: &str, report: &QuizReport) {
        self.record_quiz_completion_at(learner_id, report, Utc::now());
    }

    /// [`Self::record_quiz_completion`] with an explicit clock.
    pub fn record_quiz_completion_at(
        &self,
        learner_id: &str,
        report: &QuizReport,
        now: DateTime<Utc>,
    ) {
        self.profiles.with_profile(learner_id, |profile| {
            update::apply_quiz_report(profile, report, now);
        });
    }

    /// Topics whose spaced-review interval has elapsed as of `today`.
    pub fn due_topics(&self, learner_id: &str, today: DateTime<Utc>) -> Vec<String> {
        self.profiles
            .with_profile(learner_id, |profile| schedule::due_topics(profile, today))
    }

    /// Build a personalized study plan as of `today`.
    pub fn study_plan(&self, learner_id: &str, today: DateTime<Utc>) -> StudyPlan {
        self.profiles
            .with_profile(learner_id, |profile| plan::build_study_plan(profile, today))
    }

    /// Flatten the learner's profile for persistence. A learner never seen
    /// before exports a fresh, empty profile.
    pub fn export_profile(&self, learner_id: &str) -> ProfileSnapshot {
        self.profiles
            .with_profile(learner_id, |profile| profile.snapshot())
    }

    /// Restore a profile from a persisted snapshot, replacing any state
    /// held for that learner.
    pub fn import_profile(&self, snapshot: ProfileSnapshot) -> Result<(), EngineError> {
        let profile = snapshot.into_profile()?;
        tracing::info!("imported profile for learner {}", profile.learner_id);
        self.profiles.insert(profile);
        Ok(())
    }
}
