//! Quiz report generation: scores, per-dimension accuracy, detected
//! patterns, and plain-language insights for a finalized quiz attempt.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::AnswerRecord;
use crate::patterns::{self, PatternSet, Trend};

/// Accuracy below which a topic is called out as needing focus.
const WEAK_TOPIC_THRESHOLD: f64 = 0.6;

/// Accuracy at or above which a topic is called out as a strength.
const STRONG_TOPIC_THRESHOLD: f64 = 0.8;

/// Report for a single submitted quiz attempt. Immutable once generated;
/// persistence belongs to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizReport {
    /// Identifier of the quiz attempt
    pub quiz_id: String,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// Number of answers in the attempt
    pub total_questions: u32,
    /// Wall-clock duration of the attempt in seconds
    pub time_taken_secs: f64,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    /// Fraction of answers graded correct, in [0, 1]
    pub overall_score: f64,
    /// `overall_score` scaled to [0, 100]
    pub percentage: f64,
    /// Seconds per question; None for an empty or untimed attempt
    pub average_time: Option<f64>,
    /// Seconds per correct answer; None without any correct answers
    pub time_per_correct: Option<f64>,
    /// Accuracy per topic
    pub topic_scores: BTreeMap<String, f64>,
    /// Accuracy per Bloom's taxonomy level
    pub bloom_scores: BTreeMap<String, f64>,
    /// Accuracy per question type
    pub type_scores: BTreeMap<String, f64>,
    /// Behavioral signals detected across the attempt
    pub patterns: PatternSet,
    /// Plain-language takeaways derived from the scores and patterns
    pub insights: Vec<String>,
    pub longest_correct_streak: u32,
    pub longest_incorrect_streak: u32,
    /// Accuracy trend across the attempt
    pub performance_trend: Trend,
}

/// Build the report for a finalized, ordered answer list.
pub fn generate(
    quiz_id: &str,
    answers: &[AnswerRecord],
    time_taken_secs: f64,
    at: DateTime<Utc>,
) -> QuizReport {
    let total_questions = answers.len() as u32;
    let correct_answers = answers.iter().filter(|a| a.is_correct).count() as u32;
    let overall_score = if total_questions > 0 {
        f64::from(correct_answers) / f64::from(total_questions)
    } else {
        0.0
    };

    let average_time = if time_taken_secs > 0.0 && total_questions > 0 {
        Some(time_taken_secs / f64::from(total_questions))
    } else {
        None
    };
    let time_per_correct = if time_taken_secs > 0.0 && correct_answers > 0 {
        Some(time_taken_secs / f64::from(correct_answers))
    } else {
        None
    };

    let topic_scores = accuracy_by(answers, |a| a.topic.as_str());
    let bloom_scores = accuracy_by(answers, |a| a.bloom_level.as_str());
    let type_scores = accuracy_by(answers, |a| a.question_type.as_str());

    let patterns = patterns::detect_patterns(answers);

    let mut report = QuizReport {
        quiz_id: quiz_id.to_string(),
        generated_at: at,
        total_questions,
        time_taken_secs,
        correct_answers,
        incorrect_answers: total_questions - correct_answers,
        overall_score,
        percentage: overall_score * 100.0,
        average_time,
        time_per_correct,
        topic_scores,
        bloom_scores,
        type_scores,
        patterns,
        insights: Vec::new(),
        longest_correct_streak: patterns::longest_streak(answers, true),
        longest_incorrect_streak: patterns::longest_streak(answers, false),
        performance_trend: patterns::performance_trend(answers),
    };
    report.insights = insights_for(&report);
    report
}

fn accuracy_by<'a>(
    answers: &'a [AnswerRecord],
    key: impl Fn(&'a AnswerRecord) -> &'a str,
) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for answer in answers {
        let entry = counts.entry(key(answer)).or_insert((0, 0));
        entry.1 += 1;
        if answer.is_correct {
            entry.0 += 1;
        }
    }
    counts
        .into_iter()
        .map(|(key, (correct, total))| (key.to_string(), f64::from(correct) / f64::from(total)))
        .collect()
}

/// Derive plain-language takeaways from a finished report.
fn insights_for(report: &QuizReport) -> Vec<String> {
    let mut insights = Vec::new();

    let score = report.overall_score;
    if score >= 0.9 {
        insights.push("Excellent performance! You've mastered this material.".to_string());
    } else if score >= 0.7 {
        insights.push("Good understanding. Focus on the topics you missed.".to_string());
    } else if score >= 0.5 {
        insights.push("Developing understanding. More practice recommended.".to_string());
    } else {
        insights.push("Significant gaps identified. Consider reviewing the material.".to_string());
    }

    let weak_topics: Vec<&str> = report
        .topic_scores
        .iter()
        .filter(|(_, score)| **score < WEAK_TOPIC_THRESHOLD)
        .map(|(topic, _)| topic.as_str())
        .take(3)
        .collect();
    if !weak_topics.is_empty() {
        insights.push(format!("Focus on: {}", weak_topics.join(", ")));
    }

    let strong_topics: Vec<&str> = report
        .topic_scores
        .iter()
        .filter(|(_, score)| **score >= STRONG_TOPIC_THRESHOLD)
        .map(|(topic, _)| topic.as_str())
        .take(3)
        .collect();
    if !strong_topics.is_empty() {
        insights.push(format!("Strong in: {}", strong_topics.join(", ")));
    }

    let bloom_advice = [
        ("remember", "Strengthen factual knowledge and memorization."),
        ("understand", "Work on comprehension and explanation skills."),
        ("apply", "Practice applying concepts to new situations."),
        ("analyze", "Develop analytical and critical thinking skills."),
    ];
    for (level, advice) in bloom_advice {
        if report
            .bloom_scores
            .get(level)
            .is_some_and(|score| *score < WEAK_TOPIC_THRESHOLD)
        {
            insights.push(advice.to_string());
        }
    }

    if report.patterns.rushing {
        insights.push("Take more time to read questions carefully.".to_string());
    }
    if report.patterns.fatigue {
        insights.push("Consider taking breaks during longer quizzes.".to_string());
    }
    if report.patterns.guessing {
        insights.push("Review the material before attempting quizzes.".to_string());
    }
    if report.patterns.improving {
        insights.push("Great progress! You're warming up nicely.".to_string());
    }

    if let Some(average_time) = report.average_time {
        if average_time > 120.0 {
            insights.push("You're being thorough, but try to improve speed.".to_string());
        } else if average_time < 20.0 {
            insights.push("Consider spending more time on each question.".to_string());
        }
    }

    insights
}
