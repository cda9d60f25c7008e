//! Compatibility scoring between two users.
//!
//! Order of preference: cached score, external inference bounded by a
//! deadline, local heuristic. Scoring never fails; every score it produces
//! (inferred or heuristic) is cached under the unordered pair key.

mod cache;
mod heuristic;
mod provider;

pub use cache::{InMemoryScoreCache, RedisScoreCache, ScoreCache};
pub use heuristic::heuristic_score;
pub use provider::{build_prompt, parse_score, InferenceError, InferenceProvider, OpenAiProvider};

use crate::domain::{PairKey, User};
use crate::metrics::COMPATIBILITY_SCORES_TOTAL;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Where a score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    Cache,
    Inference,
    Heuristic,
}

impl ScoreSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreSource::Cache => "cache",
            ScoreSource::Inference => "inference",
            ScoreSource::Heuristic => "heuristic",
        }
    }
}

#[derive(Clone)]
pub struct CompatibilityScorer {
    provider: Option<Arc<dyn InferenceProvider>>,
    cache: Arc<dyn ScoreCache>,
    timeout: Duration,
}

impl CompatibilityScorer {
    pub fn new(
        provider: Option<Arc<dyn InferenceProvider>>,
        cache: Arc<dyn ScoreCache>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            timeout,
        }
    }

    /// Scorer that never calls out; every miss goes to the heuristic
    pub fn heuristic_only(cache: Arc<dyn ScoreCache>) -> Self {
        Self::new(None, cache, Duration::ZERO)
    }

    /// Compatibility of `a` and `b` in 0..=100; symmetric through the cache.
    pub async fn score(&self, a: &User, b: &User) -> u8 {
        self.score_with_source(a, b).await.0
    }

    pub async fn score_with_source(&self, a: &User, b: &User) -> (u8, ScoreSource) {
        let key = PairKey::of(a.id, b.id);

        match self.cache.get(key).await {
            Ok(Some(score)) => {
                COMPATIBILITY_SCORES_TOTAL
                    .with_label_values(&[ScoreSource::Cache.as_str()])
                    .inc();
                return (score, ScoreSource::Cache);
            }
            Ok(None) => {}
            Err(e) => warn!(pair = %key, error = %e, "Compatibility cache read failed"),
        }

        let (score, source) = match self.infer(a, b).await {
            Some(score) => (score, ScoreSource::Inference),
            None => (
                heuristic_score(&a.profile, &b.profile),
                ScoreSource::Heuristic,
            ),
        };

        if let Err(e) = self.cache.put(key, score).await {
            warn!(pair = %key, error = %e, "Compatibility cache write failed");
        }

        COMPATIBILITY_SCORES_TOTAL
            .with_label_values(&[source.as_str()])
            .inc();
        debug!(pair = %key, score, source = source.as_str(), "Computed compatibility score");

        (score, source)
    }

    async fn infer(&self, a: &User, b: &User) -> Option<u8> {
        let provider = self.provider.as_ref()?;
        let prompt = build_prompt(&a.profile, &b.profile);

        let result = match tokio::time::timeout(self.timeout, provider.infer(&prompt)).await {
            Ok(response) => response.and_then(|text| parse_score(&text)),
            Err(_) => Err(InferenceError::Timeout(self.timeout.as_millis() as u64)),
        };

        match result {
            Ok(score) => Some(score),
            Err(e) => {
                warn!(
                    provider = provider.name(),
                    user_a = %a.id,
                    user_b = %b.id,
                    error = %e,
                    "Inference unavailable, using heuristic score"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, MatchPreferences, UserProfile};
    use crate::error::{AppError, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct FixedProvider {
        response: String,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn new(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl InferenceProvider for FixedProvider {
        async fn infer(&self, _prompt: &str) -> std::result::Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct SlowProvider;

    #[async_trait::async_trait]
    impl InferenceProvider for SlowProvider {
        async fn infer(&self, _prompt: &str) -> std::result::Result<String, InferenceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(r#"{"score": 99}"#.to_string())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct BrokenCache;

    #[async_trait::async_trait]
    impl ScoreCache for BrokenCache {
        async fn get(&self, _key: PairKey) -> Result<Option<u8>> {
            Err(AppError::Internal("cache down".to_string()))
        }

        async fn put(&self, _key: PairKey, _score: u8) -> Result<()> {
            Err(AppError::Internal("cache down".to_string()))
        }
    }

    fn user(interests: &[&str], age: i32) -> User {
        User {
            id: Uuid::new_v4(),
            profile: UserProfile {
                name: "u".to_string(),
                age,
                gender: Gender::Other,
                course: Some("CS".to_string()),
                branch: None,
                college: None,
                interests: interests.iter().map(|s| s.to_string()).collect(),
                bio: None,
                photos: Vec::new(),
            },
            preferences: MatchPreferences::default(),
            blocked_user_ids: Vec::new(),
            email_verified: true,
            is_active: true,
            is_banned: false,
        }
    }

    #[tokio::test]
    async fn test_inference_result_is_cached_for_both_orders() {
        let provider = FixedProvider::new(r#"{"score": 73, "reason": "ok"}"#);
        let cache = Arc::new(InMemoryScoreCache::new());
        let scorer = CompatibilityScorer::new(
            Some(provider.clone()),
            cache.clone(),
            Duration::from_secs(1),
        );
        let a = user(&["music"], 20);
        let b = user(&["art"], 24);

        assert_eq!(
            scorer.score_with_source(&a, &b).await,
            (73, ScoreSource::Inference)
        );
        assert_eq!(
            scorer.score_with_source(&b, &a).await,
            (73, ScoreSource::Cache)
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_response_falls_back_to_heuristic() {
        let provider = FixedProvider::new("they seem lovely");
        let scorer = CompatibilityScorer::new(
            Some(provider),
            Arc::new(InMemoryScoreCache::new()),
            Duration::from_secs(1),
        );
        let a = user(&["music", "hiking"], 20);
        let b = user(&["hiking", "art"], 21);

        assert_eq!(
            scorer.score_with_source(&a, &b).await,
            (100, ScoreSource::Heuristic)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back_to_heuristic() {
        let scorer = CompatibilityScorer::new(
            Some(Arc::new(SlowProvider)),
            Arc::new(InMemoryScoreCache::new()),
            Duration::from_millis(5_000),
        );
        let a = user(&[], 20);
        let b = user(&[], 40);

        let (score, source) = scorer.score_with_source(&a, &b).await;
        assert_eq!(source, ScoreSource::Heuristic);
        assert_eq!(score, heuristic_score(&a.profile, &b.profile));
    }

    #[tokio::test]
    async fn test_heuristic_scores_are_cached() {
        let cache = Arc::new(InMemoryScoreCache::new());
        let scorer = CompatibilityScorer::heuristic_only(cache.clone());
        let a = user(&[], 20);
        let b = user(&[], 20);

        scorer.score(&a, &b).await;
        assert_eq!(cache.get(PairKey::of(a.id, b.id)).await.unwrap(), Some(80));
    }

    #[tokio::test]
    async fn test_cache_failures_never_fail_scoring() {
        let scorer = CompatibilityScorer::heuristic_only(Arc::new(BrokenCache));
        let a = user(&["x"], 20);
        let b = user(&["x"], 20);

        assert_eq!(scorer.score(&a, &b).await, 100);
    }
}
