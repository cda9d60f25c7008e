/// Match handlers - suggestions, swipes, match listing and unmatch
use crate::domain::MatchStatus;
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::services::{MatchSummary, Suggestion};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    pub target_user_id: Option<String>,
    pub action: Option<String>,
}

impl SwipeRequest {
    fn validate(&self) -> Result<(Uuid, &str)> {
        let target = self
            .target_user_id
            .as_deref()
            .ok_or_else(|| AppError::InvalidArgument("targetUserId is required".to_string()))?;
        let action = self
            .action
            .as_deref()
            .ok_or_else(|| AppError::InvalidArgument("action is required".to_string()))?;

        let target = Uuid::parse_str(target.trim())
            .map_err(|_| AppError::InvalidArgument("targetUserId is not a valid id".to_string()))?;

        Ok((target, action))
    }
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeMatchView {
    pub id: Uuid,
    pub status: MatchStatus,
    pub is_match: bool,
    pub compatibility_score: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub message: &'static str,
    #[serde(rename = "match")]
    pub match_view: SwipeMatchView,
}

#[derive(Debug, Serialize)]
pub struct MatchesResponse {
    pub matches: Vec<MatchSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /api/matches/suggestions
pub async fn get_suggestions(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let suggestions = state.suggestions.suggestions(user_id.0).await?;

    Ok(HttpResponse::Ok().json(SuggestionsResponse {
        count: suggestions.len(),
        suggestions,
    }))
}

/// POST /api/matches/swipe
pub async fn swipe(
    state: web::Data<AppState>,
    user_id: UserId,
    req: web::Json<SwipeRequest>,
) -> Result<HttpResponse> {
    let (target, action) = req.validate()?;
    let outcome = state.swipes.swipe(user_id.0, target, action).await?;

    let message = if outcome.is_new_match {
        "It's a match!"
    } else {
        "Swipe recorded"
    };

    Ok(HttpResponse::Ok().json(SwipeResponse {
        message,
        match_view: SwipeMatchView {
            id: outcome.match_id,
            status: outcome.status,
            is_match: outcome.is_new_match,
            compatibility_score: outcome.compatibility_score,
        },
    }))
}

/// GET /api/matches/matches
pub async fn get_matches(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let matches = state.listing.matches(user_id.0).await?;

    Ok(HttpResponse::Ok().json(MatchesResponse {
        count: matches.len(),
        matches,
    }))
}

/// DELETE /api/matches/match/{id}
pub async fn unmatch(
    state: web::Data<AppState>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let match_id = Uuid::parse_str(path.trim())
        .map_err(|_| AppError::InvalidArgument("match id is not a valid id".to_string()))?;

    state.listing.unmatch(match_id, user_id.0).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Unmatched successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swipe_request_requires_both_fields() {
        let missing_action = SwipeRequest {
            target_user_id: Some(Uuid::new_v4().to_string()),
            action: None,
        };
        assert!(matches!(
            missing_action.validate(),
            Err(AppError::InvalidArgument(_))
        ));

        let missing_target = SwipeRequest {
            target_user_id: None,
            action: Some("like".to_string()),
        };
        assert!(matches!(
            missing_target.validate(),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_swipe_request_rejects_malformed_id() {
        let req = SwipeRequest {
            target_user_id: Some("not-a-uuid".to_string()),
            action: Some("like".to_string()),
        };
        assert!(matches!(req.validate(), Err(AppError::InvalidArgument(_))));
    }

    #[test]
    fn test_swipe_response_shape() {
        let id = Uuid::new_v4();
        let body = serde_json::to_value(SwipeResponse {
            message: "It's a match!",
            match_view: SwipeMatchView {
                id,
                status: MatchStatus::Matched,
                is_match: true,
                compatibility_score: Some(88),
            },
        })
        .unwrap();

        assert_eq!(body["match"]["status"], "matched");
        assert_eq!(body["match"]["isMatch"], true);
        assert_eq!(body["match"]["compatibilityScore"], 88);
        assert_eq!(body["match"]["id"], id.to_string());
    }
}
