use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hackers_auth_types::identity::BearerIdentity;

use crate::domain::content::{
    Post, PostDetail, PostFlag, PostQuery, PostSort, PostSummary, PostUpdate,
};
use crate::domain::repository::Persistence;
use crate::error::ApiError;
use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::state::AppState;
use crate::usecase::post::{
    CreatePostInput, CreatePostUseCase, DeletePostUseCase, GetPostBySlugUseCase, GetPostUseCase,
    ListPostsUseCase, TogglePostFlagUseCase, UpdatePostUseCase,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub url: Option<String>,
    pub text: Option<String>,
    pub user_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[serde(rename = "created_at", serialize_with = "hackers_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "hackers_core::serde::to_rfc3339_ms")]
    pub updated: DateTime<Utc>,
    #[serde(rename = "is_stickied")]
    pub is_stickied: bool,
    #[serde(rename = "is_visible")]
    pub is_visible: bool,
    #[serde(rename = "is_deleted")]
    pub is_deleted: bool,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            url: p.url,
            text: p.text,
            user_id: p.user_id,
            category_id: p.category_id,
            created_at: p.created_at,
            updated: p.updated,
            is_stickied: p.is_stickied,
            is_visible: p.is_visible,
            is_deleted: p.is_deleted,
        }
    }
}

/// Listing row. Key casing follows what forum clients already read.
#[derive(Serialize)]
pub struct PostSummaryResponse {
    #[serde(rename = "postId")]
    pub post_id: Uuid,
    pub title: String,
    pub author: Option<String>,
    #[serde(serialize_with = "hackers_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    pub total_comments: u64,
    pub slug: String,
    pub is_stickied: bool,
}

impl From<PostSummary> for PostSummaryResponse {
    fn from(s: PostSummary) -> Self {
        Self {
            post_id: s.post.id,
            title: s.post.title,
            author: s.author,
            created_at: s.post.created_at,
            total_comments: s.total_comments,
            slug: s.post.slug,
            is_stickied: s.post.is_stickied,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub total: u64,
    pub total_pages: u64,
    pub results: Vec<PostSummaryResponse>,
}

#[derive(Serialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub author: Option<String>,
    pub category_display: Option<String>,
}

impl From<PostDetail> for PostDetailResponse {
    fn from(d: PostDetail) -> Self {
        Self {
            post: PostResponse::from(d.post),
            author: d.author,
            category_display: d.category,
        }
    }
}

fn parse_post_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::PostNotFound)
}

// ── GET /posts/id/{post_id} ───────────────────────────────────────────────────

pub async fn get_post<P: Persistence>(
    State(state): State<AppState<P>>,
    Extension(identity): Extension<BearerIdentity>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_post_id(&post_id)?;
    tracing::debug!(user_id = %identity.user_id, %post_id, "post requested");

    let usecase = GetPostUseCase {
        posts: state.post_repo(),
    };
    let post = usecase.execute(post_id).await?;
    Ok(Json(PostResponse::from(post)))
}

// ── GET /posts ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListPostsParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub filter: Option<String>,
    pub category_id: Option<Uuid>,
}

impl From<ListPostsParams> for PostQuery {
    fn from(p: ListPostsParams) -> Self {
        let defaults = PostQuery::default();
        PostQuery {
            page: p.page.unwrap_or(defaults.page),
            limit: p.limit.unwrap_or(defaults.limit),
            sort: p.sort_by.as_deref().map(PostSort::parse).unwrap_or_default(),
            descending: p.order.as_deref() != Some("asc"),
            filter: p.filter.unwrap_or_default(),
            category_id: p.category_id,
        }
        .normalized()
    }
}

pub async fn list_posts<P: Persistence>(
    State(state): State<AppState<P>>,
    ApiQuery(params): ApiQuery<ListPostsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = PostQuery::from(params);
    let usecase = ListPostsUseCase {
        posts: state.post_repo(),
        users: state.user_repo(),
        comments: state.comment_repo(),
    };
    let page = usecase.execute(&query).await?;
    Ok(Json(PostListResponse {
        total: page.total,
        total_pages: query.total_pages(page.total),
        results: page.items.into_iter().map(PostSummaryResponse::from).collect(),
    }))
}

// ── GET /posts/{slug} ─────────────────────────────────────────────────────────

pub async fn get_post_by_slug<P: Persistence>(
    State(state): State<AppState<P>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = GetPostBySlugUseCase {
        posts: state.post_repo(),
        users: state.user_repo(),
        categories: state.category_repo(),
    };
    let detail = usecase.execute(&slug).await?;
    Ok(Json(PostDetailResponse::from(detail)))
}

// ── POST /posts ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub url: Option<String>,
    pub text: Option<String>,
    pub category_id: Option<Uuid>,
}

pub async fn create_post<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    ApiJson(body): ApiJson<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = CreatePostUseCase {
        posts: state.post_repo(),
        categories: state.category_repo(),
    };
    let post = usecase
        .execute(
            identity.user_id,
            CreatePostInput {
                title: body.title,
                url: body.url,
                text: body.text,
                category_id: body.category_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

// ── PUT /posts/{post_id} ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "categoryId")]
    pub category_id: Option<Uuid>,
    pub is_deleted: Option<bool>,
}

pub async fn update_post<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(post_id): Path<String>,
    ApiJson(body): ApiJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = UpdatePostUseCase {
        posts: state.post_repo(),
        users: state.user_repo(),
        categories: state.category_repo(),
    };
    let post = usecase
        .execute(
            identity.user_id,
            parse_post_id(&post_id)?,
            PostUpdate {
                title: body.title,
                url: body.url,
                text: body.text,
                category_id: body.category_id,
                is_deleted: body.is_deleted,
            },
        )
        .await?;
    Ok(Json(PostResponse::from(post)))
}

// ── DELETE /posts/{post_id} ───────────────────────────────────────────────────

pub async fn delete_post<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = DeletePostUseCase {
        posts: state.post_repo(),
        users: state.user_repo(),
    };
    usecase
        .execute(identity.user_id, parse_post_id(&post_id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── PATCH /posts/{post_id}/{visibility,deletion,sticky} ───────────────────────

async fn toggle<P: Persistence>(
    state: AppState<P>,
    identity: BearerIdentity,
    post_id: &str,
    flag: PostFlag,
) -> Result<Json<PostResponse>, ApiError> {
    let usecase = TogglePostFlagUseCase {
        posts: state.post_repo(),
        users: state.user_repo(),
    };
    let post = usecase
        .execute(identity.user_id, parse_post_id(post_id)?, flag)
        .await?;
    Ok(Json(PostResponse::from(post)))
}

pub async fn toggle_visibility<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(state, identity, &post_id, PostFlag::Visible).await
}

pub async fn toggle_deletion<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(state, identity, &post_id, PostFlag::Deleted).await
}

pub async fn toggle_sticky<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    toggle(state, identity, &post_id, PostFlag::Stickied).await
}
