//! JWT issuing and validation.
//!
//! Three token classes exist, each signed with its own HMAC secret so that a
//! leaked secret for one class cannot be used to forge another:
//!
//! | Kind | Payload | Default lifetime |
//! |------|---------|------------------|
//! | [`TokenKind::Access`] | `{ user: { id } }` | 20 minutes |
//! | [`TokenKind::Refresh`] | `{ user: { id } }` | 30 days |
//! | [`TokenKind::Reset`] | `{ email }` | 30 minutes |
//!
//! Every token also carries `iat`, `exp` and a random `jti`, so two tokens
//! minted for the same subject within the same second never collide.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access-token lifetime in seconds (20 minutes).
pub const ACCESS_TOKEN_TTL_SECS: u64 = 20 * 60;

/// Refresh-token lifetime in seconds (30 days).
pub const REFRESH_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Password-reset token lifetime in seconds (30 minutes).
pub const RESET_TOKEN_TTL_SECS: u64 = 30 * 60;

/// Errors returned while issuing or verifying a token.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Which secret (and lifetime) a token is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
    Reset,
}

/// Signing secrets and lifetimes for every token class.
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub reset_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub reset_ttl_secs: u64,
}

impl TokenConfig {
    /// Config with the default lifetimes.
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        reset_secret: impl Into<String>,
    ) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            reset_secret: reset_secret.into(),
            access_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_ttl_secs: REFRESH_TOKEN_TTL_SECS,
            reset_ttl_secs: RESET_TOKEN_TTL_SECS,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("reset_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("reset_ttl_secs", &self.reset_ttl_secs)
            .finish()
    }
}

/// `user` object embedded in access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
}

/// Claims of access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user: UserRef,
    pub jti: Uuid,
    pub iat: u64,
    pub exp: u64,
}

/// Claims of password-reset tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub email: String,
    pub jti: Uuid,
    pub iat: u64,
    pub exp: u64,
}

/// A freshly signed token and its expiry (seconds since UNIX epoch).
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub exp: u64,
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl SigningKey {
    fn from_secret(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }
}

struct Keys {
    access: SigningKey,
    refresh: SigningKey,
    reset: SigningKey,
}

/// Creates and verifies signed, time-bound tokens. Cheap to clone.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<Keys>,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            keys: Arc::new(Keys {
                access: SigningKey::from_secret(&config.access_secret, config.access_ttl_secs),
                refresh: SigningKey::from_secret(&config.refresh_secret, config.refresh_ttl_secs),
                reset: SigningKey::from_secret(&config.reset_secret, config.reset_ttl_secs),
            }),
        }
    }

    fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.keys.access,
            TokenKind::Refresh => &self.keys.refresh,
            TokenKind::Reset => &self.keys.reset,
        }
    }

    fn sign<C: Serialize>(&self, kind: TokenKind, claims: &C) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.key(kind).encoding).map_err(TokenError::Signing)
    }

    fn issue_session(&self, kind: TokenKind, user_id: Uuid) -> Result<IssuedToken, TokenError> {
        let iat = now_secs();
        let exp = iat + self.key(kind).ttl_secs;
        let claims = SessionClaims {
            user: UserRef { id: user_id },
            jti: Uuid::new_v4(),
            iat,
            exp,
        };
        let token = self.sign(kind, &claims)?;
        Ok(IssuedToken { token, exp })
    }

    /// Short-lived token authorizing API calls.
    pub fn issue_access(&self, user_id: Uuid) -> Result<IssuedToken, TokenError> {
        self.issue_session(TokenKind::Access, user_id)
    }

    /// Long-lived token exchanged for new access tokens.
    pub fn issue_refresh(&self, user_id: Uuid) -> Result<IssuedToken, TokenError> {
        self.issue_session(TokenKind::Refresh, user_id)
    }

    /// Self-expiring token embedded in password-reset links.
    pub fn issue_reset(&self, email: &str) -> Result<IssuedToken, TokenError> {
        let iat = now_secs();
        let exp = iat + self.keys.reset.ttl_secs;
        let claims = ResetClaims {
            email: email.to_owned(),
            jti: Uuid::new_v4(),
            iat,
            exp,
        };
        let token = self.sign(TokenKind::Reset, &claims)?;
        Ok(IssuedToken { token, exp })
    }

    /// Decode `token` against the secret of `kind`.
    ///
    /// HS256 only; `exp` is required and checked with the library's default
    /// 60 s leeway.
    pub fn verify<C: DeserializeOwned>(&self, token: &str, kind: TokenKind) -> Result<C, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        decode::<C>(token, &self.key(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }

    pub fn verify_access(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify(token, TokenKind::Refresh)
    }

    pub fn verify_reset(&self, token: &str) -> Result<ResetClaims, TokenError> {
        self.verify(token, TokenKind::Reset)
    }
}
