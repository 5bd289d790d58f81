//! Bearer-token gate for protected routes.
//!
//! [`require_bearer`] is an axum middleware that validates
//! `Authorization: Bearer <accessToken>` against the access secret and
//! attaches the caller's [`BearerIdentity`] to the request extensions.
//! [`BearerIdentity`] is also an extractor: it reuses an identity already
//! attached by the middleware, otherwise it performs the same check itself.
//!
//! The gate never consults the user store. A signed, unexpired access token is
//! honoured for its whole lifetime.

use axum::Json;
use axum::extract::{FromRef, FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::header::AUTHORIZATION;
use http::request::Parts;
use uuid::Uuid;

use crate::token::TokenIssuer;

/// Identity decoded from a valid access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BearerIdentity {
    pub user_id: Uuid,
}

/// Rejection returned by the bearer gate. Always `401`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BearerRejection {
    #[error("No token, authorization denied")]
    MissingToken,
    #[error("Token is not valid")]
    InvalidToken,
}

impl IntoResponse for BearerRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "message": self.to_string() });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, BearerRejection> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(BearerRejection::MissingToken)?
        .to_str()
        .map_err(|_| BearerRejection::InvalidToken)?;
    let (scheme, token) = value
        .split_once(' ')
        .ok_or(BearerRejection::InvalidToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(BearerRejection::InvalidToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(BearerRejection::MissingToken);
    }
    Ok(token)
}

/// Validate the bearer header of `parts` against the access secret.
pub fn authenticate(parts: &Parts, issuer: &TokenIssuer) -> Result<BearerIdentity, BearerRejection> {
    let token = bearer_token(parts)?;
    let claims = issuer.verify_access(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        BearerRejection::InvalidToken
    })?;
    Ok(BearerIdentity {
        user_id: claims.user.id,
    })
}

/// Middleware: reject with 401 unless a valid access token is presented.
///
/// Apply with `route_layer(middleware::from_fn_with_state(issuer, require_bearer))`.
pub async fn require_bearer(
    State(issuer): State<TokenIssuer>,
    request: Request,
    next: Next,
) -> Result<Response, BearerRejection> {
    let (mut parts, body) = request.into_parts();
    let identity = authenticate(&parts, &issuer)?;
    parts.extensions.insert(identity);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

impl<S> FromRequestParts<S> for BearerIdentity
where
    TokenIssuer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = BearerRejection;

    // Resolve synchronously and hand back a 'static future; `parts` is not
    // captured across the await point.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = match parts.extensions.get::<BearerIdentity>() {
            Some(identity) => Ok(*identity),
            None => authenticate(parts, &TokenIssuer::from_ref(state)),
        };
        async move { result }
    }
}
