use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hackers_auth_types::cookie::SessionCookieError;

/// Failures surfaced by the API. Every variant renders as `{"message": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0} is already registered")]
    HandleTaken(String),
    #[error("{0} is already registered")]
    EmailTaken(String),
    #[error("Email not registered")]
    EmailNotRegistered,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Password is too long")]
    PasswordTooLong,
    #[error(transparent)]
    Session(#[from] SessionCookieError),
    #[error("Token is not valid")]
    InvalidRefreshToken,
    #[error("{0} is already registered")]
    AlreadyRegistered(String),
    #[error("{0} is not registered")]
    NotRegistered(String),
    #[error("Invalid verification code")]
    InvalidVerificationCode,
    #[error("Invalid token")]
    InvalidResetToken,
    #[error("{0}")]
    MalformedBody(String),
    #[error("Invalid image data")]
    InvalidImage,
    #[error("Nothing to update")]
    MissingData,
    #[error("Not allowed to modify another user")]
    Forbidden,
    #[error("User not found")]
    UserNotFound,
    #[error("Post not found")]
    PostNotFound,
    #[error("Comment not found")]
    CommentNotFound,
    #[error("Category not found")]
    CategoryNotFound,
    #[error("{0} is already taken")]
    SlugTaken(String),
    #[error("Not permitted")]
    NotPermitted,
    #[error("Server Error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Stable tag for log lines. Never sent to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HandleTaken(_) => "HANDLE_TAKEN",
            Self::EmailTaken(_) => "EMAIL_TAKEN",
            Self::EmailNotRegistered => "EMAIL_NOT_REGISTERED",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::PasswordTooLong => "PASSWORD_TOO_LONG",
            Self::Session(_) => "INVALID_SESSION",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            Self::NotRegistered(_) => "NOT_REGISTERED",
            Self::InvalidVerificationCode => "INVALID_CODE",
            Self::InvalidResetToken => "INVALID_RESET_TOKEN",
            Self::MalformedBody(_) => "MALFORMED_BODY",
            Self::InvalidImage => "INVALID_IMAGE",
            Self::MissingData => "MISSING_DATA",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::PostNotFound => "POST_NOT_FOUND",
            Self::CommentNotFound => "COMMENT_NOT_FOUND",
            Self::CategoryNotFound => "CATEGORY_NOT_FOUND",
            Self::SlugTaken(_) => "SLUG_TAKEN",
            Self::NotPermitted => "NOT_PERMITTED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::HandleTaken(_) | Self::EmailTaken(_) | Self::SlugTaken(_) => {
                StatusCode::CONFLICT
            }
            Self::EmailNotRegistered
            | Self::UserNotFound
            | Self::PostNotFound
            | Self::CommentNotFound
            | Self::CategoryNotFound => StatusCode::NOT_FOUND,
            Self::InvalidPassword | Self::Session(_) | Self::InvalidRefreshToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::AlreadyRegistered(_)
            | Self::NotRegistered(_)
            | Self::InvalidVerificationCode
            | Self::InvalidResetToken
            | Self::PasswordTooLong
            | Self::MalformedBody(_)
            | Self::InvalidImage
            | Self::MissingData => StatusCode::BAD_REQUEST,
            Self::Forbidden | Self::NotPermitted => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected client errors and TraceLayer already records the status.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = self.kind(), "internal error");
        }
        let body = serde_json::json!({ "message": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
