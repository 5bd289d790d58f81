use std::sync::Arc;

use anyhow::Context as _;
use rand::RngExt;

use hackers_auth_types::token::TokenIssuer;

use crate::domain::password::PasswordHasher;
use crate::domain::repository::{Mailer, OneTimeCodeRepository, UserRepository};
use crate::domain::types::{MailMessage, OneTimeCode, VERIFICATION_CODE_DIGITS};
use crate::error::ApiError;

/// Uniform numeric code, zero-padded to [`VERIFICATION_CODE_DIGITS`].
fn generate_code() -> String {
    let upper = 10u32.pow(VERIFICATION_CODE_DIGITS as u32);
    let n = rand::rng().random_range(0..upper);
    format!("{n:0width$}", width = VERIFICATION_CODE_DIGITS)
}

fn verification_mail(code: &str) -> MailMessage {
    MailMessage {
        subject: "Verify your email".to_owned(),
        html: format!("<h1>Enter the following code to verify your email</h1>\n<p>{code}</p>"),
    }
}

fn reset_mail(link: &str) -> MailMessage {
    MailMessage {
        subject: "Reset your password".to_owned(),
        html: format!(
            "<h1>Click on the following link to reset your password</h1>\n<p><a href=\"{link}\">{link}</a></p>"
        ),
    }
}

// ── Send verification email ──────────────────────────────────────────────────

pub struct SendVerificationUseCase<U, C>
where
    U: UserRepository,
    C: OneTimeCodeRepository,
{
    pub users: U,
    pub codes: C,
    pub mailer: Arc<dyn Mailer>,
}

impl<U, C> SendVerificationUseCase<U, C>
where
    U: UserRepository,
    C: OneTimeCodeRepository,
{
    /// Proves ownership of an address before it is registered.
    pub async fn execute(&self, email: String) -> Result<(), ApiError> {
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ApiError::AlreadyRegistered(email));
        }

        let code = generate_code();
        self.codes
            .create(&OneTimeCode::new(email.clone(), code.clone()))
            .await?;
        self.mailer.send(&email, verification_mail(&code));
        Ok(())
    }
}

// ── Check verification code ──────────────────────────────────────────────────

pub struct CheckVerificationInput {
    pub email: String,
    pub code: String,
}

/// Read-only: a matching code is not consumed and no flag is stored on any user.
pub struct CheckVerificationUseCase<C: OneTimeCodeRepository> {
    pub codes: C,
}

impl<C: OneTimeCodeRepository> CheckVerificationUseCase<C> {
    pub async fn execute(&self, input: CheckVerificationInput) -> Result<(), ApiError> {
        self.codes
            .find_by(&input.email, &input.code)
            .await?
            .ok_or(ApiError::InvalidVerificationCode)?;
        Ok(())
    }
}

// ── Forgot password ──────────────────────────────────────────────────────────

pub struct ForgotPasswordUseCase<U, C>
where
    U: UserRepository,
    C: OneTimeCodeRepository,
{
    pub users: U,
    pub codes: C,
    pub tokens: TokenIssuer,
    pub mailer: Arc<dyn Mailer>,
    pub reset_link_base: String,
}

impl<U, C> ForgotPasswordUseCase<U, C>
where
    U: UserRepository,
    C: OneTimeCodeRepository,
{
    pub async fn execute(&self, email: String) -> Result<(), ApiError> {
        if self.users.find_by_email(&email).await?.is_none() {
            return Err(ApiError::NotRegistered(email));
        }

        let token = self
            .tokens
            .issue_reset(&email)
            .context("issue reset token")?
            .token;
        self.codes
            .create(&OneTimeCode::new(email.clone(), token.clone()))
            .await?;

        let link = format!("{}?token={token}", self.reset_link_base);
        self.mailer.send(&email, reset_mail(&link));
        Ok(())
    }
}

// ── Reset password ───────────────────────────────────────────────────────────

pub struct ResetPasswordInput {
    pub token: String,
    pub new_password: String,
}

pub struct ResetPasswordUseCase<U, C>
where
    U: UserRepository,
    C: OneTimeCodeRepository,
{
    pub users: U,
    pub codes: C,
    pub tokens: TokenIssuer,
    pub hasher: PasswordHasher,
}

impl<U, C> ResetPasswordUseCase<U, C>
where
    U: UserRepository,
    C: OneTimeCodeRepository,
{
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<(), ApiError> {
        let claims = self.tokens.verify_reset(&input.token).map_err(|e| {
            tracing::debug!(error = %e, "rejected reset token");
            ApiError::InvalidResetToken
        })?;

        self.codes
            .find_by(&claims.email, &input.token)
            .await?
            .ok_or(ApiError::InvalidResetToken)?;

        // Account removed after the link was sent.
        let mut user = self
            .users
            .find_by_email(&claims.email)
            .await?
            .ok_or(ApiError::InvalidResetToken)?;

        user.password_hash = self.hasher.hash(&input.new_password).await?;
        self.codes.delete_by_code(&input.token).await?;
        self.users.save(&user).await?;

        tracing::info!(user_id = %user.id, "password reset");
        Ok(())
    }
}
