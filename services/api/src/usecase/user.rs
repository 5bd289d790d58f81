use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use uuid::Uuid;

use crate::domain::repository::{ImageStore, UserRepository};
use crate::domain::types::{ProfileUpdate, User};
use crate::error::ApiError;

fn ensure_self(caller: Uuid, target: Uuid) -> Result<(), ApiError> {
    if caller == target {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Accepts raw base64 or a `data:image/<type>;base64,` URL.
pub fn decode_image(payload: &str) -> Result<Vec<u8>, ApiError> {
    let data = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:image/") => data,
        _ => payload,
    };
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|_| ApiError::InvalidImage)?;
    if bytes.is_empty() {
        return Err(ApiError::InvalidImage);
    }
    Ok(bytes)
}

// ── List / Get ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(&self) -> Result<Vec<User>, ApiError> {
        self.users.list().await
    }
}

pub struct GetUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetUserUseCase<U> {
    pub async fn execute(&self, id: Uuid) -> Result<User, ApiError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

// ── Update profile ────────────────────────────────────────────────────────────

pub struct UpdateProfileUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UpdateProfileUseCase<U> {
    pub async fn execute(
        &self,
        caller: Uuid,
        target: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, ApiError> {
        ensure_self(caller, target)?;
        if update.is_empty() {
            return Err(ApiError::MissingData);
        }
        let mut user = self
            .users
            .find_by_id(target)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        update.apply(&mut user);
        self.users.save(&user).await?;
        Ok(user)
    }
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> DeleteUserUseCase<U> {
    pub async fn execute(&self, caller: Uuid, target: Uuid) -> Result<(), ApiError> {
        ensure_self(caller, target)?;
        if !self.users.delete(target).await? {
            return Err(ApiError::UserNotFound);
        }
        tracing::info!(user_id = %target, "user deleted");
        Ok(())
    }
}

// ── Upload avatar ─────────────────────────────────────────────────────────────

pub struct UploadAvatarUseCase<U: UserRepository> {
    pub users: U,
    pub images: Arc<dyn ImageStore>,
}

impl<U: UserRepository> UploadAvatarUseCase<U> {
    /// Returns the stored avatar URL.
    pub async fn execute(
        &self,
        caller: Uuid,
        target: Uuid,
        payload: &str,
    ) -> Result<String, ApiError> {
        ensure_self(caller, target)?;
        let mut user = self
            .users
            .find_by_id(target)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        let bytes = decode_image(payload)?;

        let url = self.images.upload(bytes).await?;
        user.avatar = Some(url.clone());
        self.users.save(&user).await?;
        Ok(url)
    }
}
