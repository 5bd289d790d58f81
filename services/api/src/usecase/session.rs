use anyhow::Context as _;
use uuid::Uuid;

use hackers_auth_types::token::{IssuedToken, TokenIssuer};

use crate::domain::password::PasswordHasher;
use crate::domain::repository::UserRepository;
use crate::error::ApiError;

// ── Login ─────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user_id: Uuid,
    pub access_token: IssuedToken,
    pub refresh_token: IssuedToken,
}

pub struct LoginUseCase<U: UserRepository> {
    pub users: U,
    pub hasher: PasswordHasher,
    pub tokens: TokenIssuer,
}

impl<U: UserRepository> LoginUseCase<U> {
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, ApiError> {
        let mut user = self
            .users
            .find_by_email(&input.email)
            .await?
            .ok_or(ApiError::EmailNotRegistered)?;

        if !self.hasher.verify(&input.password, &user.password_hash).await? {
            return Err(ApiError::InvalidPassword);
        }

        let access_token = self
            .tokens
            .issue_access(user.id)
            .context("issue access token")?;
        let refresh_token = self
            .tokens
            .issue_refresh(user.id)
            .context("issue refresh token")?;

        // Overwriting the stored token is what invalidates the previous session.
        user.refresh_token = Some(refresh_token.token.clone());
        self.users.save(&user).await?;

        Ok(LoginOutput {
            user_id: user.id,
            access_token,
            refresh_token,
        })
    }
}

// ── Refresh ───────────────────────────────────────────────────────────────────

pub struct RefreshUseCase<U: UserRepository> {
    pub users: U,
    pub tokens: TokenIssuer,
}

impl<U: UserRepository> RefreshUseCase<U> {
    /// Mint a new access token. The refresh token itself is not rotated.
    pub async fn execute(&self, refresh_token: &str) -> Result<IssuedToken, ApiError> {
        let claims = self.tokens.verify_refresh(refresh_token).map_err(|e| {
            tracing::debug!(error = %e, "rejected refresh token");
            ApiError::InvalidRefreshToken
        })?;

        let user = self
            .users
            .find_by_id(claims.user.id)
            .await?
            .ok_or(ApiError::InvalidRefreshToken)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(ApiError::InvalidRefreshToken);
        }

        let access_token = self
            .tokens
            .issue_access(user.id)
            .context("issue access token")?;
        Ok(access_token)
    }
}

// ── Logout ────────────────────────────────────────────────────────────────────

pub struct LogoutUseCase<U: UserRepository> {
    pub users: U,
    pub tokens: TokenIssuer,
}

impl<U: UserRepository> LogoutUseCase<U> {
    /// Drop the stored refresh token when `refresh_token` is the live one.
    /// Returns whether anything was revoked; a stale or forged token is a no-op.
    pub async fn execute(&self, refresh_token: &str) -> Result<bool, ApiError> {
        let Ok(claims) = self.tokens.verify_refresh(refresh_token) else {
            return Ok(false);
        };
        let Some(mut user) = self.users.find_by_id(claims.user.id).await? else {
            return Ok(false);
        };
        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Ok(false);
        }

        user.refresh_token = None;
        self.users.save(&user).await?;
        tracing::info!(user_id = %user.id, "session revoked");
        Ok(true)
    }
}
