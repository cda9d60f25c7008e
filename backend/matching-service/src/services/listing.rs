use super::{require_active_user, MatchLedger};
use crate::domain::{Match, PublicUser};
use crate::error::Result;
use crate::repository::UserDirectory;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// A current mutual match from one participant's point of view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: Uuid,
    pub user: PublicUser,
    pub compatibility_score: Option<u8>,
    pub matched_at: Option<DateTime<Utc>>,
}

pub struct MatchListService {
    ledger: MatchLedger,
    directory: Arc<dyn UserDirectory>,
}

impl MatchListService {
    pub fn new(ledger: MatchLedger, directory: Arc<dyn UserDirectory>) -> Self {
        Self { ledger, directory }
    }

    /// Matched pairs of `user_id`, newest first, with the other party's
    /// public profile.
    pub async fn matches(&self, user_id: Uuid) -> Result<Vec<MatchSummary>> {
        require_active_user(self.directory.as_ref(), user_id).await?;
        let records = self.ledger.matched_for(user_id).await?;

        let counterpart_ids: Vec<Uuid> = records
            .iter()
            .filter_map(|m| m.counterpart(user_id))
            .collect();
        let users: HashMap<Uuid, PublicUser> = self
            .directory
            .find_by_ids(&counterpart_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.to_public()))
            .collect();

        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            let Some(other_id) = record.counterpart(user_id) else {
                continue;
            };
            let Some(user) = users.get(&other_id) else {
                warn!(match_id = %record.id, user_id = %other_id, "Matched user missing from directory");
                continue;
            };

            summaries.push(MatchSummary {
                id: record.id,
                user: user.clone(),
                compatibility_score: record.compatibility_score,
                matched_at: record.matched_at,
            });
        }

        Ok(summaries)
    }

    /// End a match on behalf of `user_id`, who must hold an active account
    /// and be one of its participants.
    pub async fn unmatch(&self, match_id: Uuid, user_id: Uuid) -> Result<Match> {
        require_active_user(self.directory.as_ref(), user_id).await?;
        self.ledger.unmatch(match_id, user_id).await
    }
}
