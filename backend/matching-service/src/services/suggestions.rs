use super::{require_active_user, CompatibilityScorer, MatchLedger};
use crate::config::MatchingConfig;
use crate::domain::{PublicUser, User};
use crate::error::Result;
use crate::metrics::SUGGESTION_DURATION_SECONDS;
use crate::repository::{CandidateFilter, UserDirectory};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// One ranked candidate
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub user: PublicUser,
    pub compatibility_score: u8,
}

/// Highest scores first, keeping input order among equal scores, cut to `limit`.
pub fn rank_suggestions(mut scored: Vec<Suggestion>, limit: usize) -> Vec<Suggestion> {
    // sort_by is stable
    scored.sort_by(|a, b| b.compatibility_score.cmp(&a.compatibility_score));
    scored.truncate(limit);
    scored
}

pub struct SuggestionRanker {
    ledger: MatchLedger,
    directory: Arc<dyn UserDirectory>,
    scorer: CompatibilityScorer,
    config: MatchingConfig,
}

impl SuggestionRanker {
    pub fn new(
        ledger: MatchLedger,
        directory: Arc<dyn UserDirectory>,
        scorer: CompatibilityScorer,
        config: MatchingConfig,
    ) -> Self {
        Self {
            ledger,
            directory,
            scorer,
            config,
        }
    }

    /// Ranked suggestions for `requester_id`.
    ///
    /// The pool leaves out the requester, everyone they share a match
    /// record with, everyone they blocked or who blocked them, and accounts
    /// that are unverified, inactive or banned. The requester's own account
    /// must pass the same check.
    pub async fn suggestions(&self, requester_id: Uuid) -> Result<Vec<Suggestion>> {
        let timer = SUGGESTION_DURATION_SECONDS.start_timer();

        let requester = require_active_user(self.directory.as_ref(), requester_id).await?;

        let filter = self.candidate_filter(&requester).await?;
        let candidates = self.directory.find_candidates(&filter).await?;
        let pool_size = candidates.len();

        let scorer = &self.scorer;
        let requester = &requester;
        let scored: Vec<Suggestion> = stream::iter(candidates)
            .map(|candidate| async move {
                let compatibility_score = scorer.score(requester, &candidate).await;
                Suggestion {
                    user: candidate.to_public(),
                    compatibility_score,
                }
            })
            .buffered(self.config.scoring_concurrency.max(1))
            .collect()
            .await;

        let ranked = rank_suggestions(scored, self.config.suggestion_limit);
        timer.observe_duration();

        debug!(
            user_id = %requester_id,
            pool_size,
            returned = ranked.len(),
            "Built suggestions"
        );
        Ok(ranked)
    }

    async fn candidate_filter(&self, requester: &User) -> Result<CandidateFilter> {
        let mut exclude_ids = self.ledger.swiped_user_ids(requester.id).await?;
        exclude_ids.insert(requester.id);
        exclude_ids.extend(requester.blocked_user_ids.iter().copied());

        Ok(CandidateFilter {
            requester_id: requester.id,
            exclude_ids,
            genders: requester.preferences.genders.clone(),
            age_range: requester.preferences.age_range,
            limit: self.config.candidate_pool_limit,
        })
    }
}
