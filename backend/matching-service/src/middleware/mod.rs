/// Request identity for matching-service
///
/// Session validation happens at the gateway; it forwards the authenticated
/// user as `X-User-Id`. Handlers take `UserId` as an extractor.
use crate::error::AppError;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// Authenticated caller
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

impl FromRequest for UserId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing user identity".to_string()))
            .and_then(|raw| {
                Uuid::parse_str(raw.trim())
                    .map_err(|_| AppError::Unauthorized("invalid user identity".to_string()))
            })
            .map(UserId);

        ready(result)
    }
}
