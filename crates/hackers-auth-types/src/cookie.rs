//! Session transport: the `cookieValue` cookie.
//!
//! The cookie holds JSON `{"refreshToken": "...", "userId": "..."}`. It is
//! HTTP-only with path `/` and carries no `Secure` or `SameSite`
//! attribute.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

/// Cookie name carrying the session payload.
pub const SESSION_COOKIE: &str = "cookieValue";

/// Payload stored in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub user_id: String,
}

impl SessionCookie {
    pub fn new(refresh_token: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            user_id: user_id.to_string(),
        }
    }

    /// Parse a raw cookie value. Never assumes shape.
    pub fn parse(raw: &str) -> Result<Self, SessionCookieError> {
        let session: Self =
            serde_json::from_str(raw).map_err(|_| SessionCookieError::Unparsable)?;
        if session.refresh_token.is_empty() {
            return Err(SessionCookieError::MissingRefreshToken);
        }
        Ok(session)
    }
}

/// Why a request's session cookie could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionCookieError {
    #[error("No cookie provided")]
    Missing,
    #[error("Invalid cookie")]
    Unparsable,
    #[error("No token, authorization denied")]
    MissingRefreshToken,
}

/// Write the session cookie onto the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use hackers_auth_types::cookie::{SessionCookie, SESSION_COOKIE, set_session_cookie};
///
/// let session = SessionCookie::new("refresh", uuid::Uuid::nil());
/// let jar = set_session_cookie(CookieJar::new(), &session).unwrap();
/// let cookie = jar.get(SESSION_COOKIE).unwrap();
/// assert_eq!(cookie.path(), Some("/"));
/// assert!(cookie.http_only().unwrap_or(false));
/// assert_eq!(cookie.secure(), None);
/// assert_eq!(cookie.same_site(), None);
/// ```
pub fn set_session_cookie(
    jar: CookieJar,
    session: &SessionCookie,
) -> Result<CookieJar, serde_json::Error> {
    let value = serde_json::to_string(session)?;
    let cookie = Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .build();
    Ok(jar.add(cookie))
}

/// Read and parse the session cookie from an incoming request's jar.
pub fn read_session_cookie(jar: &CookieJar) -> Result<SessionCookie, SessionCookieError> {
    let cookie = jar.get(SESSION_COOKIE).ok_or(SessionCookieError::Missing)?;
    SessionCookie::parse(cookie.value())
}

/// Expire the session cookie (Max-Age=0).
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .http_only(true)
        .build();
    jar.add(cookie)
}
