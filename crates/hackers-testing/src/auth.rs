//! Credential helpers for integration tests.
//!
//! Mint real access tokens with a throwaway [`TokenIssuer`] and build the
//! `Authorization` header or `cookieValue` cookie a browser would send.

use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};
use axum_extra::extract::cookie::Cookie;
use hackers_auth_types::cookie::{SESSION_COOKIE, SessionCookie};
use hackers_auth_types::token::{TokenConfig, TokenIssuer};
use uuid::Uuid;

pub const TEST_ACCESS_SECRET: &str = "test-access-secret-for-unit-tests-only";
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret-for-unit-tests-only";
pub const TEST_RESET_SECRET: &str = "test-reset-secret-for-unit-tests-only";

/// Token config with the test secrets and default lifetimes.
pub fn test_token_config() -> TokenConfig {
    TokenConfig::new(TEST_ACCESS_SECRET, TEST_REFRESH_SECRET, TEST_RESET_SECRET)
}

pub fn test_issuer() -> TokenIssuer {
    TokenIssuer::new(&test_token_config())
}

/// Caller identity backed by a freshly signed access token.
pub struct BearerAuth {
    pub user_id: Uuid,
    pub token: String,
}

impl BearerAuth {
    /// Sign an access token for `user_id` with `issuer`.
    ///
    /// Panics if signing fails.
    pub fn new(issuer: &TokenIssuer, user_id: Uuid) -> Self {
        let token = issuer
            .issue_access(user_id)
            .expect("failed to sign test access token")
            .token;
        Self { user_id, token }
    }

    /// `Authorization: Bearer <token>` as a header map.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .expect("token is a valid header value"),
        );
        map
    }
}

/// A `cookieValue` cookie carrying `refresh_token` for `user_id`.
pub fn session_cookie(refresh_token: &str, user_id: Uuid) -> Cookie<'static> {
    let value = serde_json::to_string(&SessionCookie::new(refresh_token, user_id))
        .expect("session cookie serializes");
    Cookie::new(SESSION_COOKIE, value)
}
