use crate::domain::{AgeRange, CanonicalPair, Gender, Match, MatchUpdate, User};
use crate::error::Result;
use std::collections::HashSet;
use uuid::Uuid;

/// Persistent pair ledger. Implementations enforce one record per canonical
/// pair and reject stale writes.
#[async_trait::async_trait]
pub trait MatchStore: Send + Sync {
    /// Look up the record for a canonical pair
    async fn find_by_pair(&self, pair: &CanonicalPair) -> Result<Option<Match>>;

    /// Look up a record by its id
    async fn find_by_id(&self, match_id: Uuid) -> Result<Option<Match>>;

    /// Insert a pending record for the pair.
    /// Returns `AppError::Conflict` if a record for the pair already exists.
    async fn create_pair(&self, pair: &CanonicalPair) -> Result<Match>;

    /// Compare-and-set update. Returns `AppError::Conflict` when the stored
    /// version no longer equals `expected_version`.
    async fn update_pair(
        &self,
        match_id: Uuid,
        expected_version: i64,
        update: &MatchUpdate,
    ) -> Result<Match>;

    /// Ids of every user sharing a record with `user_id`, whoever swiped first
    async fn counterpart_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    /// Matched records involving `user_id`, most recent `matched_at` first
    async fn list_matched(&self, user_id: Uuid) -> Result<Vec<Match>>;

    /// Health check (optional)
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Criteria for the candidate pool of one requester
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    /// Candidates who blocked this user are left out
    pub requester_id: Uuid,
    /// The requester, swiped users and blocked users
    pub exclude_ids: HashSet<Uuid>,
    /// Accepted genders; empty accepts all
    pub genders: Vec<Gender>,
    pub age_range: Option<AgeRange>,
    pub limit: usize,
}

impl CandidateFilter {
    /// Whether `user` belongs in the pool, ignoring the limit
    pub fn admits(&self, user: &User) -> bool {
        if self.exclude_ids.contains(&user.id) || !user.is_discoverable() {
            return false;
        }
        if user.blocked_user_ids.contains(&self.requester_id) {
            return false;
        }
        if !self.genders.is_empty() && !self.genders.contains(&user.profile.gender) {
            return false;
        }
        match self.age_range {
            Some(range) => range.contains(user.profile.age),
            None => true,
        }
    }
}

/// User directory owned by the user-management service (read-only here)
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Batch lookup; unknown ids are silently absent from the result
    async fn find_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>>;

    /// At most `filter.limit` users admitted by the filter, in store order
    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<User>>;
}
