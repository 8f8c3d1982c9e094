//! Adaptive learning engine for the Quizzical platform.
//!
//! Consumes the session summaries and quiz reports produced by
//! `qz-analytics` and maintains one [`LearnerProfile`] per learner: topic
//! mastery, per-bloom-level performance, timing, and learning velocity.
//! From a profile it derives adjusted quiz configurations (difficulty mix,
//! focus topics, question count, question type weighting), spaced-repetition
//! review dates, and personalized study plans.

pub mod adapt;
pub mod config;
pub mod engine;
pub mod plan;
pub mod profile;
pub mod schedule;
pub mod store;
pub mod update;

pub use config::QuizConfig;
pub use engine::AdaptiveEngine;
pub use profile::{LearnerProfile, PerformanceLevel, ProfileSnapshot};
pub use qz_analytics::EngineError;
pub use store::ProfileStore;
