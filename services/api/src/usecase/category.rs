use uuid::Uuid;

use crate::domain::content::Category;
use crate::domain::repository::{CategoryRepository, UserRepository};
use crate::error::ApiError;
use crate::usecase::access::ensure_admin;

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::MalformedBody("Name is required".to_owned()));
    }
    Ok(())
}

pub struct ListCategoriesUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> ListCategoriesUseCase<C> {
    pub async fn execute(&self) -> Result<Vec<Category>, ApiError> {
        self.categories.list().await
    }
}

pub struct GetCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> GetCategoryUseCase<C> {
    pub async fn execute(&self, id: Uuid) -> Result<Category, ApiError> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CategoryNotFound)
    }
}

// ── Admin-only writes ─────────────────────────────────────────────────────────

pub struct CreateCategoryUseCase<C: CategoryRepository, U: UserRepository> {
    pub categories: C,
    pub users: U,
}

impl<C: CategoryRepository, U: UserRepository> CreateCategoryUseCase<C, U> {
    pub async fn execute(
        &self,
        caller: Uuid,
        name: String,
        description: Option<String>,
    ) -> Result<Category, ApiError> {
        ensure_admin(&self.users, caller).await?;
        require_name(&name)?;

        let category = Category::new(name, description);
        self.categories.create(&category).await?;
        tracing::info!(category_id = %category.id, name = %category.name, "category created");
        Ok(category)
    }
}

#[derive(Debug, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub struct UpdateCategoryUseCase<C: CategoryRepository, U: UserRepository> {
    pub categories: C,
    pub users: U,
}

impl<C: CategoryRepository, U: UserRepository> UpdateCategoryUseCase<C, U> {
    pub async fn execute(
        &self,
        caller: Uuid,
        id: Uuid,
        update: CategoryUpdate,
    ) -> Result<Category, ApiError> {
        ensure_admin(&self.users, caller).await?;
        if update.name.is_none() && update.description.is_none() {
            return Err(ApiError::MissingData);
        }
        let mut category = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CategoryNotFound)?;

        if let Some(name) = update.name {
            require_name(&name)?;
            category.name = name;
        }
        if let Some(description) = update.description {
            category.description = Some(description);
        }
        self.categories.save(&category).await?;
        Ok(category)
    }
}

pub struct DeleteCategoryUseCase<C: CategoryRepository, U: UserRepository> {
    pub categories: C,
    pub users: U,
}

impl<C: CategoryRepository, U: UserRepository> DeleteCategoryUseCase<C, U> {
    pub async fn execute(&self, caller: Uuid, id: Uuid) -> Result<(), ApiError> {
        ensure_admin(&self.users, caller).await?;
        if !self.categories.delete(id).await? {
            return Err(ApiError::CategoryNotFound);
        }
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }
}
