use crate::domain::User;
use crate::error::{AppError, Result};
use crate::repository::UserDirectory;
use tracing::debug;
use uuid::Uuid;

/// Load the acting user and make sure the account may use matching.
///
/// Unknown ids are `Unauthorized`; unverified, inactive or banned accounts
/// are `Forbidden`.
pub async fn require_active_user(directory: &dyn UserDirectory, user_id: Uuid) -> Result<User> {
    let user = directory
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("unknown user".to_string()))?;

    if user.is_banned {
        debug!(user_id = %user_id, "Banned account rejected");
        return Err(AppError::Forbidden("account is banned".to_string()));
    }
    if !user.is_active {
        return Err(AppError::Forbidden("account is deactivated".to_string()));
    }
    if !user.email_verified {
        return Err(AppError::Forbidden("email verification required".to_string()));
    }

    Ok(user)
}
