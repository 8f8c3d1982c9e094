//! Spaced-repetition scheduling: due checks and full review schedules.
//!
//! Two interval tables coexist on purpose. The due check walks six coarse
//! tiers indexed by mastery; the schedule builder uses three finer tiers to
//! lay out a sequence of future review dates. They answer different
//! questions ("should this topic appear in the next quiz?" vs "when should
//! the learner sit down with it again?") and are not interchangeable.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::profile::LearnerProfile;

/// Review intervals for the due check, in days. A topic's tier is
/// `floor(mastery * 6)` clamped to the table.
pub const REVIEW_INTERVALS_DAYS: [i64; 6] = [1, 3, 7, 14, 30, 90];

/// Schedule intervals for weak topics (mastery < 0.4), in days.
const WEAK_SCHEDULE_DAYS: [i64; 4] = [1, 2, 4, 7];

/// Schedule intervals for developing topics (mastery < 0.7), in days.
const DEVELOPING_SCHEDULE_DAYS: [i64; 4] = [2, 5, 10, 20];

/// Schedule intervals for strong topics, in days.
const STRONG_SCHEDULE_DAYS: [i64; 4] = [7, 14, 30, 60];

/// Days to wait before reviewing a topic at the given mastery.
pub fn review_interval_days(mastery: f64) -> i64 {
    let tier = ((mastery * REVIEW_INTERVALS_DAYS.len() as f64) as usize)
        .min(REVIEW_INTERVALS_DAYS.len() - 1);
    REVIEW_INTERVALS_DAYS[tier]
}

/// Topics whose review interval has elapsed since the learner's last
/// session. A profile that has never recorded a session has nothing due.
pub fn due_topics(profile: &LearnerProfile, today: DateTime<Utc>) -> Vec<String> {
    let Some(last_session) = profile.last_session else {
        return Vec::new();
    };
    let days_since_last = (today - last_session).num_days();

    profile
        .topics_mastery
        .iter()
        .filter(|(_, mastery)| days_since_last >= review_interval_days(**mastery))
        .map(|(topic, _)| topic.clone())
        .collect()
}

/// Build a full review schedule: for every known topic, one future date per
/// interval in the tier matching its mastery.
pub fn build_schedule(
    profile: &LearnerProfile,
    today: DateTime<Utc>,
) -> BTreeMap<String, Vec<NaiveDate>> {
    profile
        .topics_mastery
        .iter()
        .map(|(topic, mastery)| {
            let dates = schedule_intervals(*mastery)
                .iter()
                .map(|days| (today + Duration::days(*days)).date_naive())
                .collect();
            (topic.clone(), dates)
        })
        .collect()
}

fn schedule_intervals(mastery: f64) -> &'static [i64] {
    if mastery < 0.4 {
        &WEAK_SCHEDULE_DAYS
    } else if mastery < 0.7 {
        &DEVELOPING_SCHEDULE_DAYS
    } else {
        &STRONG_SCHEDULE_DAYS
    }
}
