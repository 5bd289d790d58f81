use std::ops::RangeInclusive;

use anyhow::Context as _;

use crate::error::ApiError;

/// bcrypt cost used when none is configured.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Accepted bcrypt cost range.
pub const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;

/// Longest password bcrypt can hash without truncation. Its 72-byte key
/// includes the trailing NUL.
pub const MAX_PASSWORD_BYTES: usize = 71;

/// Salted one-way password hashing (bcrypt).
///
/// Both operations run on the blocking pool so hashing never stalls the
/// reactor. Passwords longer than [`MAX_PASSWORD_BYTES`] are refused at
/// hashing and never match at verification, so no two distinct passwords
/// can share a digest.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Fails with [`ApiError::PasswordTooLong`] past [`MAX_PASSWORD_BYTES`].
    pub async fn hash(&self, plaintext: &str) -> Result<String, ApiError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(ApiError::PasswordTooLong);
        }
        let plaintext = plaintext.to_owned();
        let cost = self.cost;
        let digest =
            tokio::task::spawn_blocking(move || bcrypt::non_truncating_hash(plaintext, cost))
                .await
                .context("join password hashing task")?
                .context("hash password")?;
        Ok(digest)
    }

    /// `Ok(false)` on mismatch, including any over-long password. A digest
    /// bcrypt cannot parse is an internal error.
    pub async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, ApiError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        let matched =
            tokio::task::spawn_blocking(move || bcrypt::non_truncating_verify(plaintext, &digest))
                .await
                .context("join password verification task")?
                .context("verify password")?;
        Ok(matched)
    }
}
