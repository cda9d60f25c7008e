/// Match ledger: one record per unordered user pair, plus the rules for
/// recording swipes and detecting mutual matches.
use crate::domain::{canonical_pair, Match, MatchStatus, PairSide, SwipeAction};
use crate::error::{AppError, Result};
use crate::metrics::WRITE_CONFLICTS_TOTAL;
use crate::repository::MatchStore;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct MatchLedger {
    store: Arc<dyn MatchStore>,
    max_write_retries: u32,
}

impl MatchLedger {
    pub fn new(store: Arc<dyn MatchStore>, max_write_retries: u32) -> Self {
        Self {
            store,
            max_write_retries,
        }
    }

    pub fn max_write_retries(&self) -> u32 {
        self.max_write_retries
    }

    /// Fetch the record for `(user_a, user_b)` in either order, creating a
    /// pending one on first contact. A lost creation race re-reads the
    /// winner's record.
    pub async fn find_or_create(&self, user_a: Uuid, user_b: Uuid) -> Result<Match> {
        let pair = canonical_pair(user_a, user_b)?;

        if let Some(existing) = self.store.find_by_pair(&pair).await? {
            return Ok(existing);
        }

        match self.store.create_pair(&pair).await {
            Ok(created) => Ok(created),
            Err(AppError::Conflict(_)) => {
                debug!(pair = %pair.key(), "Lost match creation race, re-reading");
                self.store.find_by_pair(&pair).await?.ok_or_else(|| {
                    AppError::Internal(format!("match for pair {} vanished after conflict", pair.key()))
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Write `action` into the slot owned by `acting_user`.
    ///
    /// Returns `false` without touching the record when the pair is already
    /// settled (matched or unmatched).
    pub fn record_action(
        &self,
        record: &mut Match,
        acting_user: Uuid,
        action: SwipeAction,
    ) -> Result<bool> {
        let side = record.side_of(acting_user).ok_or_else(|| {
            AppError::Forbidden(format!("user {} is not part of match {}", acting_user, record.id))
        })?;

        if record.is_settled() {
            debug!(
                match_id = %record.id,
                status = record.status.as_str(),
                "Swipe on settled match ignored"
            );
            return Ok(false);
        }

        match side {
            PairSide::First => record.user_a_action = Some(action),
            PairSide::Second => record.user_b_action = Some(action),
        }
        Ok(true)
    }

    /// Promote a pending record to matched once both sides like each other.
    /// Returns true only for the call that performs the transition.
    pub fn check_mutual_match(&self, record: &mut Match) -> bool {
        if record.status != MatchStatus::Pending || !record.both_liked() {
            return false;
        }

        record.status = MatchStatus::Matched;
        if record.matched_at.is_none() {
            record.matched_at = Some(Utc::now());
        }
        true
    }

    /// Persist the record against the version it was read at.
    pub async fn save(&self, record: &Match) -> Result<Match> {
        let result = self
            .store
            .update_pair(record.id, record.version, &record.to_update())
            .await;

        if matches!(result, Err(AppError::Conflict(_))) {
            WRITE_CONFLICTS_TOTAL.inc();
        }
        result
    }

    pub async fn find_by_id(&self, match_id: Uuid) -> Result<Option<Match>> {
        self.store.find_by_id(match_id).await
    }

    /// End a relationship. Only participants may do this; the record is
    /// kept so the pair is never suggested again.
    pub async fn unmatch(&self, match_id: Uuid, acting_user: Uuid) -> Result<Match> {
        let mut attempt = 0;
        loop {
            let mut record = self
                .store
                .find_by_id(match_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("match {}", match_id)))?;

            if !record.is_participant(acting_user) {
                return Err(AppError::Forbidden(
                    "not authorized to unmatch".to_string(),
                ));
            }

            if record.status == MatchStatus::Unmatched {
                return Ok(record);
            }

            record.status = MatchStatus::Unmatched;
            match self.save(&record).await {
                Ok(saved) => {
                    info!(match_id = %match_id, user = %acting_user, "Match ended");
                    return Ok(saved);
                }
                Err(AppError::Conflict(reason)) if attempt < self.max_write_retries => {
                    attempt += 1;
                    warn!(match_id = %match_id, attempt, %reason, "Retrying unmatch after conflict");
                }
                Err(AppError::Conflict(reason)) => {
                    warn!(
                        match_id = %match_id,
                        attempts = attempt + 1,
                        %reason,
                        "Unmatch retry budget exhausted"
                    );
                    return Err(busy(match_id));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Everyone `user_id` already shares a record with, in either direction
    pub async fn swiped_user_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        Ok(self
            .store
            .counterpart_ids(user_id)
            .await?
            .into_iter()
            .collect())
    }

    /// Current mutual matches of `user_id`, newest first
    pub async fn matched_for(&self, user_id: Uuid) -> Result<Vec<Match>> {
        self.store.list_matched(user_id).await
    }
}

/// Terminal error once every retry of a write on `match_id` hit a newer version
pub(crate) fn busy(match_id: Uuid) -> AppError {
    AppError::Conflict(format!(
        "match {} is being modified concurrently, retry the request",
        match_id
    ))
}
