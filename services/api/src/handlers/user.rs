use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hackers_auth_types::identity::BearerIdentity;

use crate::domain::repository::Persistence;
use crate::domain::types::{ProfileUpdate, User, UserRole};
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::handlers::session::MessageResponse;
use crate::state::AppState;
use crate::usecase::user::{
    DeleteUserUseCase, GetUserUseCase, ListUsersUseCase, UpdateProfileUseCase,
    UploadAvatarUseCase,
};

/// Public view of an account. Credentials never leave the service.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub caption: String,
    pub bio: String,
    #[serde(serialize_with = "hackers_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.handle,
            email: u.email,
            role: u.role,
            avatar: u.avatar,
            caption: u.caption,
            bio: u.bio,
            created_at: u.created_at,
        }
    }
}

/// Unknown or malformed ids both read as "no such user".
fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::UserNotFound)
}

// ── GET /users ────────────────────────────────────────────────────────────────

pub async fn list_users<P: Persistence>(
    State(state): State<AppState<P>>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let users: Vec<UserResponse> = usecase
        .execute()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(Json(users))
}

// ── GET /users/{user_id} ──────────────────────────────────────────────────────

pub async fn get_user<P: Persistence>(
    State(state): State<AppState<P>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = GetUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(parse_user_id(&user_id)?).await?;
    Ok(Json(UserResponse::from(user)))
}

// ── PATCH /users/{user_id} ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub caption: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

pub async fn update_user<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = UpdateProfileUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(
            identity.user_id,
            parse_user_id(&user_id)?,
            ProfileUpdate {
                caption: body.caption,
                bio: body.bio,
                avatar: body.avatar,
            },
        )
        .await?;
    Ok(Json(UserResponse::from(user)))
}

// ── DELETE /users/{user_id} ───────────────────────────────────────────────────

pub async fn delete_user<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = DeleteUserUseCase {
        users: state.user_repo(),
    };
    usecase
        .execute(identity.user_id, parse_user_id(&user_id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── PATCH /users/{user_id}/upload ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UploadAvatarRequest {
    pub avatar: String,
}

pub async fn upload_avatar<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<UploadAvatarRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = UploadAvatarUseCase {
        users: state.user_repo(),
        images: state.images.clone(),
    };
    let url = usecase
        .execute(identity.user_id, parse_user_id(&user_id)?, &body.avatar)
        .await?;
    tracing::info!(user_id = %identity.user_id, %url, "avatar uploaded");

    Ok((
        StatusCode::OK,
        MessageResponse::new("Avatar uploaded successfully"),
    ))
}
