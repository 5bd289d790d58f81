use anyhow::Context as _;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use hackers_auth_types::cookie::{
    SessionCookie, clear_session_cookie, read_session_cookie, set_session_cookie,
};

use crate::domain::repository::Persistence;
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::state::AppState;
use crate::usecase::account::{RegisterInput, RegisterUseCase};
use crate::usecase::session::{LoginInput, LoginUseCase, LogoutUseCase, RefreshUseCase};

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

// ── POST /users/register ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(alias = "handle")]
    pub username: String,
    pub password: String,
    pub email: String,
}

pub async fn register<P: Persistence>(
    State(state): State<AppState<P>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        hasher: state.hasher,
    };

    usecase
        .execute(RegisterInput {
            handle: body.username,
            password: body.password,
            email: body.email,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        MessageResponse::new("User created successfully"),
    ))
}

// ── POST /users/login ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login<P: Persistence>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        hasher: state.hasher,
        tokens: state.tokens.clone(),
    };

    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;

    let session = SessionCookie::new(out.refresh_token.token, out.user_id);
    let jar = set_session_cookie(jar, &session).context("encode session cookie")?;

    Ok((
        StatusCode::OK,
        jar,
        Json(AccessTokenResponse {
            access_token: out.access_token.token,
        }),
    ))
}

// ── POST /users/refresh ───────────────────────────────────────────────────────

pub async fn refresh<P: Persistence>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let session = read_session_cookie(&jar)?;

    let usecase = RefreshUseCase {
        users: state.user_repo(),
        tokens: state.tokens.clone(),
    };
    let access_token = usecase.execute(&session.refresh_token).await?;

    Ok((
        StatusCode::OK,
        Json(AccessTokenResponse {
            access_token: access_token.token,
        }),
    ))
}

// ── POST /users/logout ────────────────────────────────────────────────────────

pub async fn logout<P: Persistence>(
    State(state): State<AppState<P>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Ok(session) = read_session_cookie(&jar) {
        let usecase = LogoutUseCase {
            users: state.user_repo(),
            tokens: state.tokens.clone(),
        };
        usecase.execute(&session.refresh_token).await?;
    }

    Ok((StatusCode::NO_CONTENT, clear_session_cookie(jar)))
}
