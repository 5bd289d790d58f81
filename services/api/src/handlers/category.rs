use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hackers_auth_types::identity::BearerIdentity;

use crate::domain::content::Category;
use crate::domain::repository::Persistence;
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::state::AppState;
use crate::usecase::category::{
    CategoryUpdate, CreateCategoryUseCase, DeleteCategoryUseCase, GetCategoryUseCase,
    ListCategoriesUseCase, UpdateCategoryUseCase,
};

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
        }
    }
}

fn parse_category_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::CategoryNotFound)
}

pub async fn list_categories<P: Persistence>(
    State(state): State<AppState<P>>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = ListCategoriesUseCase {
        categories: state.category_repo(),
    };
    let categories: Vec<CategoryResponse> = usecase
        .execute()
        .await?
        .into_iter()
        .map(CategoryResponse::from)
        .collect();
    Ok(Json(categories))
}

pub async fn get_category<P: Persistence>(
    State(state): State<AppState<P>>,
    Path(category_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = GetCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase.execute(parse_category_id(&category_id)?).await?;
    Ok(Json(CategoryResponse::from(category)))
}

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

pub async fn create_category<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    ApiJson(body): ApiJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = CreateCategoryUseCase {
        categories: state.category_repo(),
        users: state.user_repo(),
    };
    let category = usecase
        .execute(identity.user_id, body.name, body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

#[derive(Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub async fn update_category<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(category_id): Path<String>,
    ApiJson(body): ApiJson<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = UpdateCategoryUseCase {
        categories: state.category_repo(),
        users: state.user_repo(),
    };
    let category = usecase
        .execute(
            identity.user_id,
            parse_category_id(&category_id)?,
            CategoryUpdate {
                name: body.name,
                description: body.description,
            },
        )
        .await?;
    Ok(Json(CategoryResponse::from(category)))
}

pub async fn delete_category<P: Persistence>(
    State(state): State<AppState<P>>,
    identity: BearerIdentity,
    Path(category_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let usecase = DeleteCategoryUseCase {
        categories: state.category_repo(),
        users: state.user_repo(),
    };
    usecase
        .execute(identity.user_id, parse_category_id(&category_id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
