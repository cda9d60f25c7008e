use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// A single swipe decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeAction {
    Like,
    Pass,
}

impl SwipeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeAction::Like => "like",
            SwipeAction::Pass => "pass",
        }
    }
}

impl FromStr for SwipeAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "like" => Ok(SwipeAction::Like),
            "pass" => Ok(SwipeAction::Pass),
            _ => Err(AppError::InvalidArgument(
                "action must be \"like\" or \"pass\"".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Matched,
    Unmatched,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Matched => "matched",
            MatchStatus::Unmatched => "unmatched",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "matched" => Ok(MatchStatus::Matched),
            "unmatched" => Ok(MatchStatus::Unmatched),
            other => Err(AppError::Internal(format!("unknown match status: {}", other))),
        }
    }
}

/// Which canonical slot of a match a user occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    First,
    Second,
}

/// Relationship record between two distinct users, stored in canonical order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub user_a_id: Uuid,
    pub user_b_id: Uuid,
    pub user_a_action: Option<SwipeAction>,
    pub user_b_action: Option<SwipeAction>,
    pub status: MatchStatus,
    pub compatibility_score: Option<u8>,
    pub matched_at: Option<DateTime<Utc>>,
    /// Bumped on every persisted update; used for compare-and-set writes.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// Fresh record for a canonical pair: no actions, status pending.
    pub fn new(user_a_id: Uuid, user_b_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_a_id,
            user_b_id,
            user_a_action: None,
            user_b_action: None,
            status: MatchStatus::Pending,
            compatibility_score: None,
            matched_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn side_of(&self, user_id: Uuid) -> Option<PairSide> {
        if user_id == self.user_a_id {
            Some(PairSide::First)
        } else if user_id == self.user_b_id {
            Some(PairSide::Second)
        } else {
            None
        }
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.side_of(user_id).is_some()
    }

    /// The participant that is not `user_id`
    pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
        match self.side_of(user_id)? {
            PairSide::First => Some(self.user_b_id),
            PairSide::Second => Some(self.user_a_id),
        }
    }

    pub fn both_liked(&self) -> bool {
        self.user_a_action == Some(SwipeAction::Like) && self.user_b_action == Some(SwipeAction::Like)
    }

    /// Pending pairs still accept swipes; matched and unmatched pairs are settled.
    pub fn is_settled(&self) -> bool {
        self.status != MatchStatus::Pending
    }

    pub fn to_update(&self) -> MatchUpdate {
        MatchUpdate {
            user_a_action: self.user_a_action,
            user_b_action: self.user_b_action,
            status: self.status,
            compatibility_score: self.compatibility_score,
            matched_at: self.matched_at,
        }
    }
}

/// The mutable fields of a match. Every persisted change goes through this
/// struct and is validated before reaching the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchUpdate {
    pub user_a_action: Option<SwipeAction>,
    pub user_b_action: Option<SwipeAction>,
    pub status: MatchStatus,
    pub compatibility_score: Option<u8>,
    pub matched_at: Option<DateTime<Utc>>,
}

impl MatchUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(score) = self.compatibility_score {
            if score > 100 {
                return Err(AppError::InvalidArgument(format!(
                    "compatibility score {} out of range",
                    score
                )));
            }
        }

        match self.status {
            MatchStatus::Matched => {
                let both_liked = self.user_a_action == Some(SwipeAction::Like)
                    && self.user_b_action == Some(SwipeAction::Like);
                if !both_liked {
                    return Err(AppError::InvalidArgument(
                        "matched status requires both sides to like".to_string(),
                    ));
                }
                if self.matched_at.is_none() {
                    return Err(AppError::InvalidArgument(
                        "matched status requires matched_at".to_string(),
                    ));
                }
            }
            MatchStatus::Pending => {
                if self.matched_at.is_some() {
                    return Err(AppError::InvalidArgument(
                        "pending match cannot carry matched_at".to_string(),
                    ));
                }
            }
            MatchStatus::Unmatched => {
                let was_matched = self.user_a_action == Some(SwipeAction::Like)
                    && self.user_b_action == Some(SwipeAction::Like);
                if self.matched_at.is_some() && !was_matched {
                    return Err(AppError::InvalidArgument(
                        "matched_at requires both sides to like".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check the transition from `current`: `matched_at` is set only by the
    /// write that makes the pair matched and never changes afterwards.
    pub fn validate_against(&self, current: &Match) -> Result<()> {
        match (current.matched_at, self.matched_at) {
            (Some(previous), next) if next != Some(previous) => Err(AppError::InvalidArgument(
                "matched_at is immutable once set".to_string(),
            )),
            (None, Some(_)) if self.status != MatchStatus::Matched => {
                Err(AppError::InvalidArgument(
                    "matched_at can only be set when the pair becomes matched".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Apply onto a record, bumping version and `updated_at`.
    pub fn apply_to(&self, record: &mut Match) {
        record.user_a_action = self.user_a_action;
        record.user_b_action = self.user_b_action;
        record.status = self.status;
        record.compatibility_score = self.compatibility_score;
        record.matched_at = self.matched_at;
        record.version += 1;
        record.updated_at = Utc::now();
    }
}
