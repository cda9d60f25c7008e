//! In-process implementations of the store traits.
//!
//! They honour the same contracts as the PostgreSQL repositories (unique
//! canonical pair, compare-and-set updates) and back the test suites and
//! local runs without a database.

use super::{CandidateFilter, MatchStore, UserDirectory};
use crate::domain::{CanonicalPair, Match, MatchStatus, MatchUpdate, User};
use crate::error::{AppError, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct LedgerState {
    matches: HashMap<Uuid, Match>,
    by_pair: HashMap<(Uuid, Uuid), Uuid>,
}

#[derive(Default)]
pub struct InMemoryMatchStore {
    state: RwLock<LedgerState>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.state.read().await.matches.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn find_by_pair(&self, pair: &CanonicalPair) -> Result<Option<Match>> {
        let state = self.state.read().await;
        Ok(state
            .by_pair
            .get(&(pair.first, pair.second))
            .and_then(|id| state.matches.get(id))
            .cloned())
    }

    async fn find_by_id(&self, match_id: Uuid) -> Result<Option<Match>> {
        Ok(self.state.read().await.matches.get(&match_id).cloned())
    }

    async fn create_pair(&self, pair: &CanonicalPair) -> Result<Match> {
        let mut state = self.state.write().await;
        if state.by_pair.contains_key(&(pair.first, pair.second)) {
            return Err(AppError::Conflict(format!(
                "match for pair {} already exists",
                pair.key()
            )));
        }

        let record = Match::new(pair.first, pair.second);
        state.by_pair.insert((pair.first, pair.second), record.id);
        state.matches.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_pair(
        &self,
        match_id: Uuid,
        expected_version: i64,
        update: &MatchUpdate,
    ) -> Result<Match> {
        update.validate()?;

        let mut state = self.state.write().await;
        let record = state
            .matches
            .get_mut(&match_id)
            .ok_or_else(|| AppError::NotFound(format!("match {}", match_id)))?;

        if record.version != expected_version {
            return Err(AppError::Conflict(format!(
                "match {} is at version {}, expected {}",
                match_id, record.version, expected_version
            )));
        }
        update.validate_against(record)?;

        update.apply_to(record);
        Ok(record.clone())
    }

    async fn counterpart_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let state = self.state.read().await;
        Ok(state
            .matches
            .values()
            .filter_map(|m| m.counterpart(user_id))
            .collect())
    }

    async fn list_matched(&self, user_id: Uuid) -> Result<Vec<Match>> {
        let state = self.state.read().await;
        let mut matched: Vec<Match> = state
            .matches
            .values()
            .filter(|m| m.status == MatchStatus::Matched && m.is_participant(user_id))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.matched_at.cmp(&a.matched_at));
        Ok(matched)
    }
}

/// Directory over a fixed set of users, kept in insertion order.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    /// Insert or replace a user
    pub async fn upsert(&self, user: User) {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }

    async fn find_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| user_ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn find_candidates(&self, filter: &CandidateFilter) -> Result<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| filter.admits(u))
            .take(filter.limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{canonical_pair, SwipeAction};
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_pair_is_unique() {
        let store = InMemoryMatchStore::new();
        let pair = canonical_pair(Uuid::new_v4(), Uuid::new_v4()).unwrap();

        store.create_pair(&pair).await.unwrap();
        let second = store.create_pair(&pair).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_rejects_stale_version() {
        let store = InMemoryMatchStore::new();
        let pair = canonical_pair(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        let record = store.create_pair(&pair).await.unwrap();

        let mut update = record.to_update();
        update.user_a_action = Some(SwipeAction::Like);

        let saved = store.update_pair(record.id, 0, &update).await.unwrap();
        assert_eq!(saved.version, 1);

        let stale = store.update_pair(record.id, 0, &update).await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_matched_at_rewrite() {
        let store = InMemoryMatchStore::new();
        let pair = canonical_pair(Uuid::new_v4(), Uuid::new_v4()).unwrap();
        let record = store.create_pair(&pair).await.unwrap();

        let mut update = record.to_update();
        update.user_a_action = Some(SwipeAction::Like);
        update.user_b_action = Some(SwipeAction::Like);
        update.status = MatchStatus::Matched;
        update.matched_at = Some(Utc::now());
        let matched = store.update_pair(record.id, 0, &update).await.unwrap();

        let mut rewrite = matched.to_update();
        rewrite.matched_at = Some(Utc::now() + chrono::Duration::minutes(1));
        let result = store.update_pair(matched.id, matched.version, &rewrite).await;
        assert!(matches!(result, Err(AppError::InvalidArgument(_))));

        let stored = store.find_by_id(matched.id).await.unwrap().unwrap();
        assert_eq!(stored.matched_at, matched.matched_at);
        assert_eq!(stored.version, matched.version);
    }

    #[tokio::test]
    async fn test_counterpart_ids_covers_both_sides() {
        let store = InMemoryMatchStore::new();
        let me = Uuid::new_v4();
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();

        store.create_pair(&canonical_pair(me, x).unwrap()).await.unwrap();
        store.create_pair(&canonical_pair(y, me).unwrap()).await.unwrap();

        let mut ids = store.counterpart_ids(me).await.unwrap();
        ids.sort();
        let mut expected = vec![x, y];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
