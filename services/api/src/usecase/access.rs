//! Who may change content.

use uuid::Uuid;

use crate::domain::repository::UserRepository;
use crate::domain::types::UserRole;
use crate::error::ApiError;

/// Admins only. An unknown caller is refused.
pub async fn ensure_admin<U: UserRepository>(users: &U, caller: Uuid) -> Result<(), ApiError> {
    match users.find_by_id(caller).await? {
        Some(user) if user.role == UserRole::Admin => Ok(()),
        _ => Err(ApiError::NotPermitted),
    }
}

/// The author of the content, or an admin.
pub async fn ensure_author_or_admin<U: UserRepository>(
    users: &U,
    caller: Uuid,
    author: Option<Uuid>,
) -> Result<(), ApiError> {
    if author == Some(caller) {
        return Ok(());
    }
    ensure_admin(users, caller).await
}
