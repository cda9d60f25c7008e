use super::ledger::busy;
use super::{require_active_user, CompatibilityScorer, MatchLedger};
use crate::domain::{canonical_pair, Match, MatchStatus, SwipeAction};
use crate::error::{AppError, Result};
use crate::metrics::{NEW_MATCHES_TOTAL, SWIPES_TOTAL};
use crate::repository::UserDirectory;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Result of one swipe as seen by the acting user
#[derive(Debug, Clone)]
pub struct SwipeOutcome {
    pub match_id: Uuid,
    pub status: MatchStatus,
    /// True only for the swipe that turned the pair into a match
    pub is_new_match: bool,
    pub compatibility_score: Option<u8>,
}

impl SwipeOutcome {
    fn from_record(record: &Match, is_new_match: bool) -> Self {
        Self {
            match_id: record.id,
            status: record.status,
            is_new_match,
            compatibility_score: record.compatibility_score,
        }
    }
}

pub struct SwipeProcessor {
    ledger: MatchLedger,
    directory: Arc<dyn UserDirectory>,
    scorer: CompatibilityScorer,
}

impl SwipeProcessor {
    pub fn new(
        ledger: MatchLedger,
        directory: Arc<dyn UserDirectory>,
        scorer: CompatibilityScorer,
    ) -> Self {
        Self {
            ledger,
            directory,
            scorer,
        }
    }

    /// Record `acting_user`'s `action` on `target_user`.
    ///
    /// Read, apply and write run as one compare-and-set unit per pair; a
    /// concurrent swipe on the same pair forces a re-read, so the second
    /// like always observes the first and exactly one caller sees the new
    /// match.
    ///
    /// The acting account must exist and be verified, active and not banned.
    pub async fn swipe(
        &self,
        acting_user: Uuid,
        target_user: Uuid,
        action: &str,
    ) -> Result<SwipeOutcome> {
        let action: SwipeAction = action.parse()?;
        canonical_pair(acting_user, target_user)?;

        let acting = require_active_user(self.directory.as_ref(), acting_user).await?;

        let target = self
            .directory
            .find_by_id(target_user)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", target_user)))?;

        let mut attempt = 0;

        loop {
            let mut record = self.ledger.find_or_create(acting_user, target_user).await?;

            if !self.ledger.record_action(&mut record, acting_user, action)? {
                return Ok(SwipeOutcome::from_record(&record, false));
            }

            let is_new_match = self.ledger.check_mutual_match(&mut record);
            if is_new_match && record.compatibility_score.is_none() {
                record.compatibility_score = Some(self.scorer.score(&acting, &target).await);
            }

            match self.ledger.save(&record).await {
                Ok(saved) => {
                    SWIPES_TOTAL.with_label_values(&[action.as_str()]).inc();
                    if is_new_match {
                        NEW_MATCHES_TOTAL.inc();
                        info!(
                            match_id = %saved.id,
                            user_a = %saved.user_a_id,
                            user_b = %saved.user_b_id,
                            score = ?saved.compatibility_score,
                            "New mutual match"
                        );
                    } else {
                        debug!(
                            match_id = %saved.id,
                            user = %acting_user,
                            action = action.as_str(),
                            "Swipe recorded"
                        );
                    }
                    return Ok(SwipeOutcome::from_record(&saved, is_new_match));
                }
                Err(AppError::Conflict(reason)) if attempt < self.ledger.max_write_retries() => {
                    attempt += 1;
                    warn!(
                        match_id = %record.id,
                        attempt,
                        %reason,
                        "Concurrent swipe on pair, re-applying"
                    );
                }
                Err(AppError::Conflict(reason)) => {
                    warn!(
                        match_id = %record.id,
                        attempts = attempt + 1,
                        %reason,
                        "Swipe retry budget exhausted"
                    );
                    return Err(busy(record.id));
                }
                Err(e) => return Err(e),
            }
        }
    }
}
