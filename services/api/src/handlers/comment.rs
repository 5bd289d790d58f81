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

use crate::domain::content::{Comment, CommentView};
use crate::domain::repository::Persistence;
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::state::AppState;
use crate::usecase::comment::{
    CreateCommentInput, CreateCommentUseCase, DeleteCommentUseCase, GetCommentUseCase,
    ListCommentsUseCase, ListPostCommentsUseCase, UpdateCommentUseCase,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub text: String,
    #[serde(serialize_with = "hackers_core::serde::to_rfc3339_ms")]
    pub created: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            post_id: c.post_id,
            parent_id: c.parent_id,
            text: c.text,
            created: c.created,
        }
    }
}

#[derive(Serialize)]
pub struct CommentViewResponse {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub author: Option<String>,
}

impl From<CommentView> for CommentViewResponse {
    fn from(v: CommentView) -> Self {
        Self {
            comment: CommentResponse::from(v.comment),
            author: v.author,
        }
    }
}

fn parse_comment_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::CommentNotFound)
}

// ── GET /comments ─────────────────────────────────────────────────────────────

pub async fn list_comments<P: Persistence>(
    State(state): State<AppState<P>>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = ListCommentsUseCase {
        comments: state.comment_repo(),
    };
    let comments: Vec<CommentResponse> = usecase
        .execute()
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();
    Ok(Json(comments))
}

// ── GET /comments/{comment_id} ────────────────────────────────────────────────

pub async fn get_comment<P: Persistence>(
    State(state): State<AppState<P>>,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = GetCommentUseCase {
        comments: state.comment_repo(),
    };
    let comment = usecase.execute(parse_comment_id(&comment_id)?).await?;
    Ok(Json(CommentResponse::from(comment)))
}

// ── GET /comments/commentsByPost/{post_id} ────────────────────────────────────

pub async fn list_post_comments<P: Persistence>(
    State(state): State<AppState<P>>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id: Uuid = post_id.parse().map_err(|_| ApiError::PostNotFound)?;
    let usecase = ListPostCommentsUseCase {
        comments: state.comment_repo(),
        posts: state.post_repo(),
        users: state.user_repo(),
    };
    let thread: Vec<CommentViewResponse> = usecase
        .execute(post_id)
        .await?
        .into_iter()
        .map(CommentViewResponse::from)
        .collect();
    Ok(Json(thread))
}

// ── POST /comments ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub text: String,
}

pub async fn create_comment<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    ApiJson(body): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = CreateCommentUseCase {
        comments: state.comment_repo(),
        posts: state.post_repo(),
    };
    let comment = usecase
        .execute(
            identity.user_id,
            CreateCommentInput {
                post_id: body.post_id,
                parent_id: body.parent_id,
                text: body.text,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

// ── PUT /comments/{comment_id} ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub text: String,
}

pub async fn update_comment<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(comment_id): Path<String>,
    ApiJson(body): ApiJson<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = UpdateCommentUseCase {
        comments: state.comment_repo(),
        users: state.user_repo(),
    };
    let comment = usecase
        .execute(identity.user_id, parse_comment_id(&comment_id)?, body.text)
        .await?;
    Ok(Json(CommentResponse::from(comment)))
}

// ── DELETE /comments/{comment_id} ─────────────────────────────────────────────

pub async fn delete_comment<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(comment_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = DeleteCommentUseCase {
        comments: state.comment_repo(),
        users: state.user_repo(),
    };
    usecase
        .execute(identity.user_id, parse_comment_id(&comment_id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
