#![allow(dead_code)]

use matching_service::config::MatchingConfig;
use matching_service::domain::{AgeRange, Gender, MatchPreferences, User, UserProfile};
use matching_service::repository::memory::{InMemoryMatchStore, InMemoryUserDirectory};
use matching_service::services::{
    CompatibilityScorer, InMemoryScoreCache, InferenceError, InferenceProvider,
};
use matching_service::state::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            user: User {
                id: Uuid::new_v4(),
                profile: UserProfile {
                    name: name.to_string(),
                    age: 20,
                    gender: Gender::Other,
                    course: None,
                    branch: None,
                    college: Some("State University".to_string()),
                    interests: Vec::new(),
                    bio: None,
                    photos: Vec::new(),
                },
                preferences: MatchPreferences::default(),
                blocked_user_ids: Vec::new(),
                email_verified: true,
                is_active: true,
                is_banned: false,
            },
        }
    }

    pub fn age(mut self, age: i32) -> Self {
        self.user.profile.age = age;
        self
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.user.profile.gender = gender;
        self
    }

    pub fn course(mut self, course: &str) -> Self {
        self.user.profile.course = Some(course.to_string());
        self
    }

    pub fn interests(mut self, interests: &[&str]) -> Self {
        self.user.profile.interests = interests.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn wants(mut self, genders: &[Gender]) -> Self {
        self.user.preferences.genders = genders.to_vec();
        self
    }

    pub fn age_range(mut self, min: i32, max: i32) -> Self {
        self.user.preferences.age_range = Some(AgeRange { min, max });
        self
    }

    pub fn blocks(mut self, other: Uuid) -> Self {
        self.user.blocked_user_ids.push(other);
        self
    }

    pub fn unverified(mut self) -> Self {
        self.user.email_verified = false;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.user.is_active = false;
        self
    }

    pub fn banned(mut self) -> Self {
        self.user.is_banned = true;
        self
    }

    pub fn build(self) -> User {
        self.user
    }
}

/// Returns the same completion every time and counts calls
pub struct CountingProvider {
    response: String,
    pub calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl InferenceProvider for CountingProvider {
    async fn infer(&self, _prompt: &str) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

pub struct FailingProvider;

#[async_trait::async_trait]
impl InferenceProvider for FailingProvider {
    async fn infer(&self, _prompt: &str) -> Result<String, InferenceError> {
        Err(InferenceError::Status {
            status: 503,
            body: "overloaded".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

pub struct Harness {
    pub store: Arc<InMemoryMatchStore>,
    pub directory: Arc<InMemoryUserDirectory>,
    pub cache: Arc<InMemoryScoreCache>,
    pub state: AppState,
}

pub fn harness(users: Vec<User>) -> Harness {
    harness_with(users, None, MatchingConfig::default())
}

pub fn harness_with(
    users: Vec<User>,
    provider: Option<Arc<dyn InferenceProvider>>,
    config: MatchingConfig,
) -> Harness {
    let store = Arc::new(InMemoryMatchStore::new());
    let directory = Arc::new(InMemoryUserDirectory::new(users));
    let cache = Arc::new(InMemoryScoreCache::new());
    let scorer = CompatibilityScorer::new(provider, cache.clone(), Duration::from_secs(1));

    let state = AppState::new(store.clone(), directory.clone(), scorer, config);

    Harness {
        store,
        directory,
        cache,
        state,
    }
}
