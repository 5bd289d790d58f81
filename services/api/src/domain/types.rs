use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Caption given to new accounts.
pub const DEFAULT_CAPTION: &str = "Hello World!";

/// Bio given to new accounts.
pub const DEFAULT_BIO: &str = "This is my bio.";

/// Number of digits in an email verification code.
pub const VERIFICATION_CODE_DIGITS: usize = 7;

/// One-time codes stop being retrievable after this many seconds.
pub const ONE_TIME_CODE_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// Account record: identity, credential and the single live refresh token.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    /// Most recently issued refresh token. Only this value is accepted at refresh.
    pub refresh_token: Option<String>,
    pub avatar: Option<String>,
    pub caption: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(handle: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            handle,
            email,
            password_hash,
            role: UserRole::User,
            refresh_token: None,
            avatar: None,
            caption: DEFAULT_CAPTION.to_owned(),
            bio: DEFAULT_BIO.to_owned(),
            created_at: Utc::now(),
        }
    }
}

/// Short-lived proof of email ownership: a numeric code or a signed reset token.
#[derive(Debug, Clone)]
pub struct OneTimeCode {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl OneTimeCode {
    pub fn new(email: String, code: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            email,
            code,
            created_at: Utc::now(),
        }
    }
}

/// Profile fields a user may change on their own account.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub caption: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.caption.is_none() && self.bio.is_none() && self.avatar.is_none()
    }

    pub fn apply(self, user: &mut User) {
        if let Some(caption) = self.caption {
            user.caption = caption;
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = Some(avatar);
        }
    }
}

/// Outgoing email body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub html: String,
}
