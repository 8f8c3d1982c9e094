//! Personalized study plans and per-topic recommendations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::profile::LearnerProfile;
use crate::schedule;

/// Mastery a focus area aims for.
const FOCUS_TARGET_MASTERY: f64 = 0.7;

/// How many weaknesses the immediate-focus list covers.
const MAX_FOCUS_AREAS: usize = 3;

/// A study resource suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct StudyResource {
    /// Resource kind: "article", "video" or "exercise"
    pub kind: String,
    pub title: String,
    pub url: String,
}

/// One topic the learner should work on right away.
#[derive(Debug, Clone, Serialize)]
pub struct FocusArea {
    pub topic: String,
    /// Current mastery, 0.0 when the topic has no recorded mastery yet
    pub mastery: f64,
    /// Mastery the focus work aims for
    pub target: f64,
    /// Suggested sitting length
    pub estimated_time: String,
    pub resources: Vec<StudyResource>,
}

/// A personalized study plan built from the learner's weaknesses and the
/// spaced-repetition schedule.
#[derive(Debug, Clone, Serialize)]
pub struct StudyPlan {
    /// Weakest topics with targets and resources
    pub immediate_focus: Vec<FocusArea>,
    /// Goals for roughly the next week
    pub short_term_goals: Vec<String>,
    /// Goals for roughly the next month
    pub long_term_goals: Vec<String>,
    /// Resources covering every current weakness
    pub recommended_resources: Vec<StudyResource>,
    /// Future review dates per topic (three-tier schedule)
    pub practice_schedule: BTreeMap<String, Vec<NaiveDate>>,
}

/// Build a study plan for the profile as of `today`.
pub fn build_study_plan(profile: &LearnerProfile, today: DateTime<Utc>) -> StudyPlan {
    let immediate_focus = profile
        .weaknesses
        .iter()
        .take(MAX_FOCUS_AREAS)
        .map(|topic| FocusArea {
            topic: topic.clone(),
            mastery: profile.topics_mastery.get(topic).copied().unwrap_or(0.0),
            target: FOCUS_TARGET_MASTERY,
            estimated_time: "30-45 minutes".to_string(),
            resources: topic_resources(topic),
        })
        .collect();

    let mut short_term_goals = Vec::new();
    if !profile.weaknesses.is_empty() {
        let named: Vec<&str> = profile
            .weaknesses
            .iter()
            .take(2)
            .map(String::as_str)
            .collect();
        short_term_goals.push(format!("Achieve 70% mastery in {}", named.join(", ")));
    }
    short_term_goals.push("Complete 50 practice questions".to_string());
    short_term_goals.push("Review all incorrect answers from recent quizzes".to_string());

    let long_term_goals = vec![
        "Achieve 80% overall accuracy".to_string(),
        "Master all topics to at least 60% proficiency".to_string(),
        "Progress to higher-order thinking questions".to_string(),
    ];

    let recommended_resources = profile
        .weaknesses
        .iter()
        .map(|topic| StudyResource {
            kind: "video".to_string(),
            title: format!("{topic} Explained"),
            url: format!("#video-{topic}"),
        })
        .collect();

    StudyPlan {
        immediate_focus,
        short_term_goals,
        long_term_goals,
        recommended_resources,
        practice_schedule: schedule::build_schedule(profile, today),
    }
}

/// Recommendations for a topic at the given performance, banded the same
/// way the report insights are.
pub fn recommendations(topic: &str, performance: f64) -> Vec<String> {
    if performance < 0.4 {
        vec![
            format!("Review fundamental concepts of {topic}"),
            format!("Practice more basic {topic} problems"),
            "Consider watching introductory videos on this topic".to_string(),
        ]
    } else if performance < 0.7 {
        vec![
            format!("Focus on understanding {topic} applications"),
            "Try solving varied problem types".to_string(),
            "Review your notes and attempt practice exercises".to_string(),
        ]
    } else {
        vec![
            format!("Challenge yourself with advanced {topic} problems"),
            "Try teaching this concept to someone else".to_string(),
            "Explore real-world applications".to_string(),
        ]
    }
}

/// Placeholder resource list; a deployment wires this to its content
/// catalog.
fn topic_resources(topic: &str) -> Vec<StudyResource> {
    vec![
        StudyResource {
            kind: "article".to_string(),
            title: format!("Understanding {topic}"),
            url: "#".to_string(),
        },
        StudyResource {
            kind: "video".to_string(),
            title: format!("{topic} Explained"),
            url: "#".to_string(),
        },
        StudyResource {
            kind: "exercise".to_string(),
            title: format!("Practice {topic}"),
            url: "#".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn today() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn profile_with_weaknesses() -> LearnerProfile {
        let mut profile = LearnerProfile::new("amy");
        profile.topics_mastery.insert("Algebra".to_string(), 0.3);
        profile.topics_mastery.insert("Biology".to_string(), 0.5);
        profile.topics_mastery.insert("Chemistry".to_string(), 0.9);
        profile.refresh_strengths_weaknesses();
        profile
    }

    #[test]
    fn plan_focuses_on_the_weakest_topics() {
        let plan = build_study_plan(&profile_with_weaknesses(), today());
        let topics: Vec<&str> = plan
            .immediate_focus
            .iter()
            .map(|f| f.topic.as_str())
            .collect();
        assert_eq!(topics, vec!["Biology", "Algebra"]);
        assert_eq!(plan.immediate_focus[0].mastery, 0.5);
        assert_eq!(plan.immediate_focus[0].target, FOCUS_TARGET_MASTERY);
        assert_eq!(plan.immediate_focus[0].resources.len(), 3);
    }

    #[test]
    fn plan_names_weaknesses_in_short_term_goals() {
        let plan = build_study_plan(&profile_with_weaknesses(), today());
        assert!(plan.short_term_goals[0].contains("Biology"));
        assert_eq!(plan.short_term_goals.len(), 3);
        assert_eq!(plan.long_term_goals.len(), 3);
    }

    #[test]
    fn plan_schedules_every_known_topic() {
        let plan = build_study_plan(&profile_with_weaknesses(), today());
        assert_eq!(plan.practice_schedule.len(), 3);
        // Weak topic reviews start the very next day.
        assert_eq!(
            plan.practice_schedule["Algebra"][0],
            NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
        );
    }

    #[test]
    fn plan_for_an_empty_profile_still_has_generic_goals() {
        let plan = build_study_plan(&LearnerProfile::new("amy"), today());
        assert!(plan.immediate_focus.is_empty());
        assert_eq!(plan.short_term_goals.len(), 2);
        assert!(plan.practice_schedule.is_empty());
    }

    #[test]
    fn recommendations_follow_performance_bands() {
        assert!(recommendations("Algebra", 0.2)[0].contains("fundamental"));
        assert!(recommendations("Algebra", 0.5)[0].contains("applications"));
        assert!(recommendations("Algebra", 0.9)[0].contains("advanced"));
    }
}
