use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::domain::repository::Persistence;
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::handlers::session::MessageResponse;
use crate::state::AppState;
use crate::usecase::verification::{
    CheckVerificationInput, CheckVerificationUseCase, ForgotPasswordUseCase, ResetPasswordInput,
    ResetPasswordUseCase, SendVerificationUseCase,
};

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

// ── POST /verify/send-verification-email ─────────────────────────────────────

pub async fn send_verification_email<P: Persistence>(
    State(state): State<AppState<P>>,
    ApiJson(body): ApiJson<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = SendVerificationUseCase {
        users: state.user_repo(),
        codes: state.code_repo(),
        mailer: state.mailer.clone(),
    };
    usecase.execute(body.email.clone()).await?;

    Ok((
        StatusCode::OK,
        MessageResponse::new(format!("Verification code sent to {}", body.email)),
    ))
}

// ── POST /verify/verify-verification-code ────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

pub async fn verify_verification_code<P: Persistence>(
    State(state): State<AppState<P>>,
    ApiJson(body): ApiJson<VerifyCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = CheckVerificationUseCase {
        codes: state.code_repo(),
    };
    usecase
        .execute(CheckVerificationInput {
            email: body.email,
            code: body.code,
        })
        .await?;

    Ok((StatusCode::OK, MessageResponse::new("Email verified")))
}

// ── POST /verify/forgot-password ─────────────────────────────────────────────

pub async fn forgot_password<P: Persistence>(
    State(state): State<AppState<P>>,
    ApiJson(body): ApiJson<EmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = ForgotPasswordUseCase {
        users: state.user_repo(),
        codes: state.code_repo(),
        tokens: state.tokens.clone(),
        mailer: state.mailer.clone(),
        reset_link_base: state.reset_link_base.clone(),
    };
    usecase.execute(body.email.clone()).await?;

    Ok((
        StatusCode::OK,
        MessageResponse::new(format!("Reset password link sent to {}", body.email)),
    ))
}

// ── POST /verify/reset-password ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

pub async fn reset_password<P: Persistence>(
    State(state): State<AppState<P>>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
        codes: state.code_repo(),
        tokens: state.tokens.clone(),
        hasher: state.hasher,
    };
    usecase
        .execute(ResetPasswordInput {
            token: body.token,
            new_password: body.new_password,
        })
        .await?;

    Ok((StatusCode::OK, MessageResponse::new("Password updated")))
}
