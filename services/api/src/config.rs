use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, de::Error as _};

use hackers_auth_types::token::{
    ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, RESET_TOKEN_TTL_SECS, TokenConfig,
};
use hackers_core::config::Config;

use crate::domain::password::{BCRYPT_COST_RANGE, DEFAULT_BCRYPT_COST, PasswordHasher};
use crate::domain::types::ONE_TIME_CODE_TTL_SECS;

fn default_access_ttl() -> u64 {
    ACCESS_TOKEN_TTL_SECS
}

fn default_refresh_ttl() -> u64 {
    REFRESH_TOKEN_TTL_SECS
}

fn default_reset_ttl() -> u64 {
    RESET_TOKEN_TTL_SECS
}

fn default_code_ttl() -> u64 {
    ONE_TIME_CODE_TTL_SECS
}

fn default_bcrypt_cost() -> u32 {
    DEFAULT_BCRYPT_COST
}

/// Upper bound for every configured lifetime: ten years.
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Lifetimes must be positive and at most [`MAX_TTL_SECS`].
fn ttl_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let secs = u64::deserialize(deserializer)?;
    if secs == 0 || secs > MAX_TTL_SECS {
        return Err(D::Error::custom(format!(
            "lifetime of {secs}s is outside 1..={MAX_TTL_SECS}"
        )));
    }
    Ok(secs)
}

fn bcrypt_cost<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let cost = u32::deserialize(deserializer)?;
    if !BCRYPT_COST_RANGE.contains(&cost) {
        return Err(D::Error::custom(format!(
            "bcrypt cost {cost} is outside {}..={}",
            BCRYPT_COST_RANGE.start(),
            BCRYPT_COST_RANGE.end()
        )));
    }
    Ok(cost)
}

fn default_port() -> u16 {
    4000
}

fn default_smtp_port() -> u16 {
    465
}

fn default_reset_link_base() -> String {
    "http://localhost:3000/verify/reset-password".to_owned()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_public_upload_url() -> String {
    "http://localhost:4000/uploads".to_owned()
}

/// API service configuration loaded from environment variables.
#[derive(Deserialize)]
pub struct ApiConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// Access-token secret. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    /// Refresh-token secret. Env var: `JWT_REFRESH_SECRET`.
    pub jwt_refresh_secret: String,
    /// Password-reset token secret. Env var: `JWT_RESET_SECRET`.
    pub jwt_reset_secret: String,
    #[serde(default = "default_access_ttl", deserialize_with = "ttl_secs")]
    pub access_token_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl", deserialize_with = "ttl_secs")]
    pub refresh_token_ttl_secs: u64,
    #[serde(default = "default_reset_ttl", deserialize_with = "ttl_secs")]
    pub reset_token_ttl_secs: u64,
    /// How long verification codes and reset tokens stay retrievable.
    #[serde(default = "default_code_ttl", deserialize_with = "ttl_secs")]
    pub one_time_code_ttl_secs: u64,
    /// Must lie in 4..=31.
    #[serde(default = "default_bcrypt_cost", deserialize_with = "bcrypt_cost")]
    pub bcrypt_cost: u32,
    /// TCP port to listen on (default 4000). Env var: `PORT`.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Link placed in password-reset emails; `?token=...` is appended.
    #[serde(default = "default_reset_link_base")]
    pub reset_link_base: String,
    /// SMTP relay. Mail is only logged when unset.
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub mail_from: Option<String>,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_public_upload_url")]
    pub public_upload_url: String,
}

impl Config for ApiConfig {}

/// SMTP relay settings, present only when `SMTP_HOST` is configured.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl ApiConfig {
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            access_secret: self.jwt_secret.clone(),
            refresh_secret: self.jwt_refresh_secret.clone(),
            reset_secret: self.jwt_reset_secret.clone(),
            access_ttl_secs: self.access_token_ttl_secs,
            refresh_ttl_secs: self.refresh_token_ttl_secs,
            reset_ttl_secs: self.reset_token_ttl_secs,
        }
    }

    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.bcrypt_cost)
    }

    pub fn one_time_code_ttl(&self) -> chrono::Duration {
        let secs = self.one_time_code_ttl_secs.min(MAX_TTL_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1000))
    }

    pub fn smtp(&self) -> Option<SmtpSettings> {
        let host = self.smtp_host.clone()?;
        let from = self
            .mail_from
            .clone()
            .or_else(|| self.smtp_username.clone())
            .unwrap_or_else(|| format!("no-reply@{host}"));
        Some(SmtpSettings {
            host,
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from,
        })
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("reset_token_ttl_secs", &self.reset_token_ttl_secs)
            .field("one_time_code_ttl_secs", &self.one_time_code_ttl_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("port", &self.port)
            .field("smtp_host", &self.smtp_host)
            .field("upload_dir", &self.upload_dir)
            .finish_non_exhaustive()
    }
}
