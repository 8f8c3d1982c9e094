//! Quiz configuration: the explicit structure handed to the adaptive
//! configurator, with defaults and boundary validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use qz_analytics::EngineError;

/// Default question count for a fresh configuration.
pub const DEFAULT_NUM_QUESTIONS: u32 = 10;

/// Floor the configurator never reduces a quiz below.
pub const MIN_QUESTIONS: u32 = 5;

/// Ceiling the configurator never grows a quiz beyond.
pub const MAX_QUESTIONS: u32 = 20;

fn default_num_questions() -> u32 {
    DEFAULT_NUM_QUESTIONS
}

fn default_question_types() -> Vec<String> {
    vec!["multiple_choice".to_string(), "short_answer".to_string()]
}

/// Configuration for one quiz generation request.
///
/// Callers set the fields they care about; the adaptive configurator
/// adjusts them in place and always fills `focus_topics`. No other keys are
/// invented on the caller's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Requested number of questions
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
    /// Question types to draw from, in request order
    #[serde(default = "default_question_types")]
    pub question_types: Vec<String>,
    /// Weight per Bloom's taxonomy level; replaced by the configurator with
    /// a distribution matched to the learner's performance level
    #[serde(default)]
    pub difficulty_distribution: BTreeMap<String, f64>,
    /// Topics the quiz should concentrate on; set by the configurator
    #[serde(default)]
    pub focus_topics: Vec<String>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            num_questions: default_num_questions(),
            question_types: default_question_types(),
            difficulty_distribution: BTreeMap::new(),
            focus_topics: Vec::new(),
        }
    }
}

impl QuizConfig {
    /// Validate a configuration arriving at the engine boundary.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.num_questions == 0 {
            return Err(EngineError::Validation(
                "num_questions must be at least 1".to_string(),
            ));
        }
        if self.question_types.is_empty() {
            return Err(EngineError::Validation(
                "question_types must not be empty".to_string(),
            ));
        }
        if self.question_types.iter().any(|t| t.is_empty()) {
            return Err(EngineError::Validation(
                "question types must not be empty strings".to_string(),
            ));
        }
        for (level, weight) in &self.difficulty_distribution {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(EngineError::Validation(format!(
                    "difficulty weight for '{level}' must be a non-negative number"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = QuizConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_questions, 10);
        assert_eq!(config.question_types.len(), 2);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: QuizConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.num_questions, DEFAULT_NUM_QUESTIONS);
        assert_eq!(config.question_types, default_question_types());
        assert!(config.focus_topics.is_empty());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut config = QuizConfig {
            num_questions: 0,
            ..QuizConfig::default()
        };
        assert!(config.validate().is_err());

        config.num_questions = 10;
        config.question_types.clear();
        assert!(config.validate().is_err());

        config.question_types = vec!["essay".to_string()];
        config
            .difficulty_distribution
            .insert("remember".to_string(), f64::NAN);
        assert!(config.validate().is_err());
    }
}
