//! In-memory learner profile store.
//!
//! One store is created at service start and shared by reference; it is
//! never implicitly cleared. Each profile sits behind its own lock, so two
//! learners never contend while one learner's updates (quiz submissions,
//! session folds, configuration requests) serialize against each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::profile::LearnerProfile;

/// Shared map of learner id to profile, with per-learner locking.
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: RwLock<HashMap<String, Arc<Mutex<LearnerProfile>>>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the learner's profile, creating a fresh profile on
    /// first access. All mutation goes through here so updates to one
    /// profile are serialized.
    pub fn with_profile<T>(
        &self,
        learner_id: &str,
        f: impl FnOnce(&mut LearnerProfile) -> T,
    ) -> T {
        let entry = self.entry(learner_id);
        let mut profile = entry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut profile)
    }

    /// Replace (or insert) a learner's profile wholesale, e.g. when
    /// importing a persisted snapshot.
    pub fn insert(&self, profile: LearnerProfile) {
        let entry = self.entry(&profile.learner_id);
        *entry.lock().unwrap_or_else(PoisonError::into_inner) = profile;
    }

    /// Whether a profile exists for the learner.
    pub fn contains(&self, learner_id: &str) -> bool {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(learner_id)
    }

    /// Number of stored profiles.
    pub fn len(&self) -> usize {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, learner_id: &str) -> Arc<Mutex<LearnerProfile>> {
        if let Some(existing) = self
            .profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(learner_id)
        {
            return Arc::clone(existing);
        }

        let mut profiles = self
            .profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            profiles
                .entry(learner_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(LearnerProfile::new(learner_id)))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_access_creates_a_fresh_profile() {
        let store = ProfileStore::new();
        assert!(store.is_empty());
        let total = store.with_profile("amy", |p| p.total_questions_answered);
        assert_eq!(total, 0);
        assert!(store.contains("amy"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn mutations_persist_across_accesses() {
        let store = ProfileStore::new();
        store.with_profile("amy", |p| p.total_questions_answered = 5);
        let total = store.with_profile("amy", |p| p.total_questions_answered);
        assert_eq!(total, 5);
    }

    #[test]
    fn insert_replaces_an_existing_profile() {
        let store = ProfileStore::new();
        store.with_profile("amy", |p| p.total_questions_answered = 5);

        let replacement = LearnerProfile::new("amy");
        store.insert(replacement);
        assert_eq!(store.with_profile("amy", |p| p.total_questions_answered), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn learners_do_not_share_state() {
        let store = ProfileStore::new();
        store.with_profile("amy", |p| p.total_questions_answered = 5);
        assert_eq!(store.with_profile("ben", |p| p.total_questions_answered), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn concurrent_updates_to_different_learners_complete() {
        let store = Arc::new(ProfileStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let learner = format!("learner-{}", i % 4);
                    for _ in 0..100 {
                        store.with_profile(&learner, |p| {
                            p.total_questions_answered += 1;
                            p.correct_answers += 1;
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let total: u64 = (0..4)
            .map(|i| {
                store.with_profile(&format!("learner-{i}"), |p| p.total_questions_answered)
            })
            .sum();
        assert_eq!(total, 800);
    }
}
