//! Behavioral pattern detection over a completed quiz's answer sequence.
//!
//! Every rule here is total: an answer list too short for a rule simply
//! leaves that flag unset. Small quizzes never produce errors.

use serde::{Deserialize, Serialize};

use crate::event::{AnswerRecord, MULTIPLE_CHOICE};
use crate::stats;

/// Mean answer time below which a quiz counts as rushed, in seconds.
const RUSHING_MEAN_SECS: f64 = 10.0;

/// Minimum answers before the half-split fatigue/improvement rules apply.
const HALF_SPLIT_MIN_ANSWERS: usize = 5;

/// Accuracy shift between quiz halves that flags fatigue or improvement.
const HALF_SPLIT_SHIFT: f64 = 0.2;

/// Multiple-choice accuracy band that looks like chance-level guessing
/// (four-option questions sit at 0.25).
const GUESSING_BAND: (f64, f64) = (0.2, 0.3);

/// Minimum answers before the consistency rule applies.
const CONSISTENCY_MIN_ANSWERS: usize = 3;

/// Maximum share of correctness flips for a run to count as consistent.
const CONSISTENCY_MAX_FLIP_RATIO: f64 = 0.3;

/// Minimum answers before a trend can be classified.
const TREND_MIN_ANSWERS: usize = 3;

/// Slope magnitude beyond which the trend is no longer "stable".
const TREND_SLOPE_THRESHOLD: f64 = 0.1;

/// Behavioral signals detected in a single quiz attempt.
///
/// The flags are evaluated independently and are not mutually exclusive; a
/// learner can be both rushing and improving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSet {
    /// Mean answer time under ten seconds
    pub rushing: bool,
    /// Second-half accuracy well below first-half accuracy
    pub fatigue: bool,
    /// Multiple-choice accuracy near chance level
    pub guessing: bool,
    /// Few correct/incorrect flips across the run
    pub consistent: bool,
    /// Second-half accuracy well above first-half accuracy
    pub improving: bool,
    /// Synonym flag raised together with fatigue
    pub declining: bool,
}

/// Direction of performance over the course of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl Trend {
    /// Stable string form, matching the serialized representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
            Self::InsufficientData => "insufficient_data",
        }
    }
}

/// Inspect an ordered answer sequence for behavioral signals.
pub fn detect_patterns(answers: &[AnswerRecord]) -> PatternSet {
    let mut patterns = PatternSet::default();
    if answers.is_empty() {
        return patterns;
    }

    let times: Vec<f64> = answers.iter().filter_map(|a| a.time_taken).collect();
    if !times.is_empty() && stats::mean(&times) < RUSHING_MEAN_SECS {
        patterns.rushing = true;
    }

    if answers.len() >= HALF_SPLIT_MIN_ANSWERS {
        let (first_half, second_half) = answers.split_at(answers.len() / 2);
        let first_accuracy = accuracy_of(first_half);
        let second_accuracy = accuracy_of(second_half);

        if second_accuracy < first_accuracy - HALF_SPLIT_SHIFT {
            patterns.fatigue = true;
            patterns.declining = true;
        } else if second_accuracy > first_accuracy + HALF_SPLIT_SHIFT {
            patterns.improving = true;
        }
    }

    let mc_answers: Vec<&AnswerRecord> = answers
        .iter()
        .filter(|a| a.question_type == MULTIPLE_CHOICE)
        .collect();
    if !mc_answers.is_empty() {
        let mc_accuracy =
            mc_answers.iter().filter(|a| a.is_correct).count() as f64 / mc_answers.len() as f64;
        if (GUESSING_BAND.0..=GUESSING_BAND.1).contains(&mc_accuracy) {
            patterns.guessing = true;
        }
    }

    if answers.len() >= CONSISTENCY_MIN_ANSWERS {
        let flips = answers
            .windows(2)
            .filter(|pair| pair[0].is_correct != pair[1].is_correct)
            .count();
        if flips as f64 <= answers.len() as f64 * CONSISTENCY_MAX_FLIP_RATIO {
            patterns.consistent = true;
        }
    }

    patterns
}

/// Classify the performance trend across a quiz.
///
/// Accuracy is smoothed with a rolling window of
/// `max(1, min(3, n / 3))` answers before fitting a least-squares slope, so
/// one bad answer in a long run does not flip the classification.
pub fn performance_trend(answers: &[AnswerRecord]) -> Trend {
    if answers.len() < TREND_MIN_ANSWERS {
        return Trend::InsufficientData;
    }

    let window = (answers.len() / 3).clamp(1, 3);
    let accuracies: Vec<f64> = answers.windows(window).map(accuracy_of).collect();

    let slope = stats::linear_slope(&accuracies);
    if slope > TREND_SLOPE_THRESHOLD {
        Trend::Improving
    } else if slope < -TREND_SLOPE_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Longest run of consecutive answers with the given correctness value.
pub fn longest_streak(answers: &[AnswerRecord], correct: bool) -> u32 {
    let mut longest = 0u32;
    let mut current = 0u32;
    for answer in answers {
        if answer.is_correct == correct {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn accuracy_of(answers: &[AnswerRecord]) -> f64 {
    if answers.is_empty() {
        return 0.0;
    }
    answers.iter().filter(|a| a.is_correct).count() as f64 / answers.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(correct: bool) -> AnswerRecord {
        AnswerRecord {
            is_correct: correct,
            ..AnswerRecord::default()
        }
    }

    fn timed_answer(correct: bool, secs: f64) -> AnswerRecord {
        AnswerRecord {
            is_correct: correct,
            time_taken: Some(secs),
            ..AnswerRecord::default()
        }
    }

    fn mc_answer(correct: bool) -> AnswerRecord {
        AnswerRecord {
            is_correct: correct,
            question_type: MULTIPLE_CHOICE.to_string(),
            ..AnswerRecord::default()
        }
    }

    #[test]
    fn empty_input_yields_no_patterns() {
        assert_eq!(detect_patterns(&[]), PatternSet::default());
    }

    #[test]
    fn fast_uniform_answers_flag_rushing_and_consistency() {
        let answers: Vec<_> = (0..20).map(|_| timed_answer(true, 5.0)).collect();
        let patterns = detect_patterns(&answers);
        assert!(patterns.rushing);
        assert!(patterns.consistent);
        assert!(!patterns.fatigue);
        assert!(!patterns.improving);
        // Flat accuracy over 20 answers is a stable trend, not missing data.
        assert_eq!(performance_trend(&answers), Trend::Stable);
    }

    #[test]
    fn collapsing_second_half_flags_fatigue_and_declining() {
        let answers = vec![
            answer(true),
            answer(true),
            answer(true),
            answer(false),
            answer(false),
            answer(false),
        ];
        let patterns = detect_patterns(&answers);
        assert!(patterns.fatigue);
        assert!(patterns.declining);
        assert!(!patterns.improving);
    }

    #[test]
    fn recovering_second_half_flags_improving() {
        let answers = vec![
            answer(false),
            answer(false),
            answer(false),
            answer(true),
            answer(true),
            answer(true),
        ];
        let patterns = detect_patterns(&answers);
        assert!(patterns.improving);
        assert!(!patterns.fatigue);
    }

    #[test]
    fn chance_level_multiple_choice_flags_guessing() {
        // 1 of 4 correct = 0.25, inside the guessing band.
        let answers = vec![
            mc_answer(true),
            mc_answer(false),
            mc_answer(false),
            mc_answer(false),
        ];
        assert!(detect_patterns(&answers).guessing);
    }

    #[test]
    fn guessing_ignores_non_multiple_choice_answers() {
        // Same 25% accuracy, but short-answer questions.
        let answers = vec![answer(true), answer(false), answer(false), answer(false)];
        assert!(!detect_patterns(&answers).guessing);
    }

    #[test]
    fn alternating_answers_are_not_consistent() {
        let answers = vec![
            answer(true),
            answer(false),
            answer(true),
            answer(false),
            answer(true),
            answer(false),
        ];
        assert!(!detect_patterns(&answers).consistent);
    }

    #[test]
    fn half_split_rules_need_five_answers() {
        let answers = vec![answer(true), answer(true), answer(false), answer(false)];
        let patterns = detect_patterns(&answers);
        assert!(!patterns.fatigue);
        assert!(!patterns.improving);
    }

    #[test]
    fn trend_needs_three_answers() {
        assert_eq!(
            performance_trend(&[answer(true), answer(false)]),
            Trend::InsufficientData
        );
    }

    #[test]
    fn trend_detects_decline() {
        let mut answers = vec![answer(true); 6];
        answers.extend(vec![answer(false); 6]);
        assert_eq!(performance_trend(&answers), Trend::Declining);
    }

    #[test]
    fn trend_detects_improvement() {
        let mut answers = vec![answer(false); 6];
        answers.extend(vec![answer(true); 6]);
        assert_eq!(performance_trend(&answers), Trend::Improving);
    }

    #[test]
    fn streaks_count_longest_runs() {
        let answers = vec![
            answer(true),
            answer(true),
            answer(false),
            answer(true),
            answer(true),
            answer(true),
            answer(false),
            answer(false),
        ];
        assert_eq!(longest_streak(&answers, true), 3);
        assert_eq!(longest_streak(&answers, false), 2);
        assert_eq!(longest_streak(&[], true), 0);
    }
}
