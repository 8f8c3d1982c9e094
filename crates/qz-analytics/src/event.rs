use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topic assigned to answers that arrive without one.
pub const DEFAULT_TOPIC: &str = "General";

/// Bloom level assigned to answers that arrive without one.
pub const DEFAULT_BLOOM_LEVEL: &str = "understand";

/// Question type assigned to answers that arrive without one.
pub const DEFAULT_QUESTION_TYPE: &str = "unknown";

/// Question type that the guessing heuristic applies to.
pub const MULTIPLE_CHOICE: &str = "multiple_choice";

/// A single graded answer as submitted by the quiz front end.
///
/// Missing optional fields are filled with neutral defaults at
/// deserialization so the engines never have to branch on absence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Whether the answer was graded correct
    pub is_correct: bool,
    /// Seconds the learner spent on the question, when the client measured it
    #[serde(default)]
    pub time_taken: Option<f64>,
    /// Topic the question was drawn from
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Question type (e.g. "multiple_choice", "short_answer")
    #[serde(default = "default_question_type")]
    pub question_type: String,
    /// Bloom's taxonomy level of the question
    #[serde(default = "default_bloom_level")]
    pub bloom_level: String,
    /// The learner's free-text answer, kept for mistake diagnostics
    #[serde(default)]
    pub user_answer: Option<String>,
}

impl Default for AnswerRecord {
    fn default() -> Self {
        Self {
            is_correct: false,
            time_taken: None,
            topic: default_topic(),
            question_type: default_question_type(),
            bloom_level: default_bloom_level(),
            user_answer: None,
        }
    }
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

fn default_bloom_level() -> String {
    DEFAULT_BLOOM_LEVEL.to_string()
}

fn default_question_type() -> String {
    DEFAULT_QUESTION_TYPE.to_string()
}

/// A timestamped event in a learner's activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LearnerEvent {
    /// A quiz was generated for the learner
    QuizGenerated {
        /// When the quiz was generated
        at: DateTime<Utc>,
        /// Free-form generation metadata (source document, requested size, ...)
        metadata: serde_json::Value,
    },
    /// The learner submitted an answer
    AnswerSubmitted {
        /// When the answer was submitted
        at: DateTime<Utc>,
        /// Identifier of the question answered
        question_id: String,
        /// The graded answer
        answer: AnswerRecord,
    },
}

impl LearnerEvent {
    /// Timestamp of the event.
    pub const fn at(&self) -> DateTime<Utc> {
        match self {
            Self::QuizGenerated { at, .. } | Self::AnswerSubmitted { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_record_fills_defaults_on_deserialization() {
        let record: AnswerRecord = serde_json::from_str(r#"{"is_correct": true}"#).unwrap();
        assert!(record.is_correct);
        assert_eq!(record.topic, "General");
        assert_eq!(record.bloom_level, "understand");
        assert_eq!(record.question_type, "unknown");
        assert!(record.time_taken.is_none());
        assert!(record.user_answer.is_none());
    }

    #[test]
    fn event_timestamp_accessor_covers_both_variants() {
        let at = Utc::now();
        let generated = LearnerEvent::QuizGenerated {
            at,
            metadata: serde_json::json!({"num_questions": 10}),
        };
        let answered = LearnerEvent::AnswerSubmitted {
            at,
            question_id: "q1".to_string(),
            answer: AnswerRecord::default(),
        };
        assert_eq!(generated.at(), at);
        assert_eq!(answered.at(), at);
    }
}
