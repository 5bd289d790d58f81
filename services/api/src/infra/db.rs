use std::collections::HashMap;

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Schema,
};
use uuid::Uuid;

use hackers_api_schema::{categories, comments, one_time_codes, posts, users};

use crate::domain::content::{Category, Comment, Page, Post, PostQuery, PostSort};
use crate::domain::repository::{
    CategoryRepository, CommentRepository, OneTimeCodeRepository, Persistence, PostRepository,
    UserRepository,
};
use crate::domain::types::{OneTimeCode, User, UserRole};
use crate::error::ApiError;

/// Create tables and indexes from the entities if they are missing.
pub async fn ensure_schema(db: &DatabaseConnection) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // Parent tables first: posts references users and categories, comments
    // reference posts.
    let tables = [
        schema
            .create_table_from_entity(users::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(one_time_codes::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(categories::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(posts::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(comments::Entity)
            .if_not_exists()
            .to_owned(),
    ];
    for table in &tables {
        db.execute(backend.build(table))
            .await
            .context("create table")?;
    }

    for mut index in schema.create_index_from_entity(one_time_codes::Entity) {
        db.execute(backend.build(index.if_not_exists()))
            .await
            .context("create one_time_codes index")?;
    }
    for mut index in schema.create_index_from_entity(comments::Entity) {
        db.execute(backend.build(index.if_not_exists()))
            .await
            .context("create comments index")?;
    }
    Ok(())
}

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

fn user_from_model(m: users::Model) -> Result<User, ApiError> {
    let role: UserRole = m
        .role
        .parse()
        .with_context(|| format!("user {} has an unknown role", m.id))?;
    Ok(User {
        id: m.id,
        handle: m.username,
        email: m.email,
        password_hash: m.password_hash,
        role,
        refresh_token: m.refresh_token,
        avatar: m.avatar,
        caption: m.caption,
        bio: m.bio,
        created_at: m.created_at,
    })
}

fn user_to_active(user: &User) -> users::ActiveModel {
    users::ActiveModel {
        id: Set(user.id),
        username: Set(user.handle.clone()),
        email: Set(user.email.clone()),
        password_hash: Set(user.password_hash.clone()),
        role: Set(user.role.as_str().to_owned()),
        refresh_token: Set(user.refresh_token.clone()),
        avatar: Set(user.avatar.clone()),
        caption: Set(user.caption.clone()),
        bio: Set(user.bio.clone()),
        created_at: Set(user.created_at),
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(handle))
            .one(&self.db)
            .await
            .context("find user by handle")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        // No unique index on email; the oldest account wins.
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .order_by_asc(users::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, ApiError> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list users")?;
        models.into_iter().map(user_from_model).collect()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = users::Entity::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .context("find users by ids")?;
        models.into_iter().map(user_from_model).collect()
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        user_to_active(user)
            .insert(&self.db)
            .await
            .context("insert user")?;
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), ApiError> {
        let mut active = user_to_active(user);
        // Never rewrite the identity columns.
        active.username = sea_orm::ActiveValue::NotSet;
        active.created_at = sea_orm::ActiveValue::NotSet;
        active.update(&self.db).await.context("update user")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected > 0)
    }
}

// ── One-time-code repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOneTimeCodeRepository {
    pub db: DatabaseConnection,
    /// Rows older than this are treated as gone.
    pub ttl: chrono::Duration,
}

impl DbOneTimeCodeRepository {
    fn cutoff(&self) -> chrono::DateTime<Utc> {
        Utc::now() - self.ttl
    }
}

fn code_from_model(m: one_time_codes::Model) -> OneTimeCode {
    OneTimeCode {
        id: m.id,
        email: m.email,
        code: m.code,
        created_at: m.created_at,
    }
}

impl OneTimeCodeRepository for DbOneTimeCodeRepository {
    async fn create(&self, code: &OneTimeCode) -> Result<(), ApiError> {
        one_time_codes::ActiveModel {
            id: Set(code.id),
            email: Set(code.email.clone()),
            code: Set(code.code.clone()),
            created_at: Set(code.created_at),
        }
        .insert(&self.db)
        .await
        .context("insert one-time code")?;
        Ok(())
    }

    async fn find_by(&self, email: &str, code: &str) -> Result<Option<OneTimeCode>, ApiError> {
        let model = one_time_codes::Entity::find()
            .filter(one_time_codes::Column::Email.eq(email))
            .filter(one_time_codes::Column::Code.eq(code))
            .filter(one_time_codes::Column::CreatedAt.gt(self.cutoff()))
            .one(&self.db)
            .await
            .context("find one-time code")?;
        Ok(model.map(code_from_model))
    }

    async fn delete_by_code(&self, code: &str) -> Result<u64, ApiError> {
        let result = one_time_codes::Entity::delete_many()
            .filter(one_time_codes::Column::Code.eq(code))
            .exec(&self.db)
            .await
            .context("delete one-time code")?;
        Ok(result.rows_affected)
    }

    async fn delete_expired(&self) -> Result<u64, ApiError> {
        let result = one_time_codes::Entity::delete_many()
            .filter(one_time_codes::Column::CreatedAt.lte(self.cutoff()))
            .exec(&self.db)
            .await
            .context("delete expired one-time codes")?;
        Ok(result.rows_affected)
    }
}

// ── Post repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPostRepository {
    pub db: DatabaseConnection,
}

fn post_from_model(m: posts::Model) -> Post {
    Post {
        id: m.id,
        title: m.title,
        slug: m.slug,
        url: m.url,
        text: m.text,
        user_id: m.user_id,
        category_id: m.category_id,
        created_at: m.created_at,
        updated: m.updated,
        is_stickied: m.is_stickied,
        is_visible: m.is_visible,
        is_deleted: m.is_deleted,
    }
}

fn post_to_active(post: &Post) -> posts::ActiveModel {
    posts::ActiveModel {
        id: Set(post.id),
        title: Set(post.title.clone()),
        slug: Set(post.slug.clone()),
        url: Set(post.url.clone()),
        text: Set(post.text.clone()),
        user_id: Set(post.user_id),
        category_id: Set(post.category_id),
        created_at: Set(post.created_at),
        updated: Set(post.updated),
        is_stickied: Set(post.is_stickied),
        is_visible: Set(post.is_visible),
        is_deleted: Set(post.is_deleted),
    }
}

/// `%` and `_` in user input match literally.
fn contains_pattern(needle: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

impl PostRepository for DbPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, ApiError> {
        let model = posts::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find post by id")?;
        Ok(model.map(post_from_model))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, ApiError> {
        let model = posts::Entity::find()
            .filter(posts::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .context("find post by slug")?;
        Ok(model.map(post_from_model))
    }

    async fn list(&self, query: &PostQuery) -> Result<Page<Post>, ApiError> {
        let mut select = posts::Entity::find()
            .filter(posts::Column::IsVisible.eq(true))
            .filter(posts::Column::IsDeleted.eq(false));
        if !query.filter.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(posts::Column::Title)))
                    .like(contains_pattern(&query.filter.to_lowercase())),
            );
        }
        if let Some(category_id) = query.category_id {
            select = select.filter(posts::Column::CategoryId.eq(category_id));
        }

        let total = select
            .clone()
            .count(&self.db)
            .await
            .context("count posts")?;

        let column = match query.sort {
            PostSort::Created => posts::Column::CreatedAt,
            PostSort::Updated => posts::Column::Updated,
            PostSort::Title => posts::Column::Title,
        };
        let select = select.order_by_desc(posts::Column::IsStickied);
        let select = if query.descending {
            select.order_by_desc(column)
        } else {
            select.order_by_asc(column)
        };
        let models = select
            .offset(query.offset())
            .limit(query.limit)
            .all(&self.db)
            .await
            .context("list posts")?;

        Ok(Page {
            total,
            items: models.into_iter().map(post_from_model).collect(),
        })
    }

    async fn create(&self, post: &Post) -> Result<(), ApiError> {
        post_to_active(post)
            .insert(&self.db)
            .await
            .context("insert post")?;
        Ok(())
    }

    async fn save(&self, post: &Post) -> Result<(), ApiError> {
        let mut active = post_to_active(post);
        active.user_id = sea_orm::ActiveValue::NotSet;
        active.created_at = sea_orm::ActiveValue::NotSet;
        active.update(&self.db).await.context("update post")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = posts::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete post")?;
        Ok(result.rows_affected > 0)
    }
}

// ── Comment repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCommentRepository {
    pub db: DatabaseConnection,
}

fn comment_from_model(m: comments::Model) -> Comment {
    Comment {
        id: m.id,
        user_id: m.user_id,
        post_id: m.post_id,
        parent_id: m.parent_id,
        text: m.text,
        created: m.created,
    }
}

impl CommentRepository for DbCommentRepository {
    async fn list(&self) -> Result<Vec<Comment>, ApiError> {
        let models = comments::Entity::find()
            .order_by_asc(comments::Column::Created)
            .all(&self.db)
            .await
            .context("list comments")?;
        Ok(models.into_iter().map(comment_from_model).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, ApiError> {
        let model = comments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find comment by id")?;
        Ok(model.map(comment_from_model))
    }

    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, ApiError> {
        let models = comments::Entity::find()
            .filter(comments::Column::PostId.eq(post_id))
            .order_by_asc(comments::Column::Created)
            .all(&self.db)
            .await
            .context("list comments by post")?;
        Ok(models.into_iter().map(comment_from_model).collect())
    }

    async fn count_by_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, ApiError> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = comments::Entity::find()
            .select_only()
            .column(comments::Column::PostId)
            .column_as(comments::Column::Id.count(), "total")
            .filter(comments::Column::PostId.is_in(post_ids.iter().copied()))
            .group_by(comments::Column::PostId)
            .into_tuple()
            .all(&self.db)
            .await
            .context("count comments by post")?;
        Ok(rows
            .into_iter()
            .map(|(post_id, total)| (post_id, total.max(0) as u64))
            .collect())
    }

    async fn create(&self, comment: &Comment) -> Result<(), ApiError> {
        comments::ActiveModel {
            id: Set(comment.id),
            user_id: Set(comment.user_id),
            post_id: Set(comment.post_id),
            parent_id: Set(comment.parent_id),
            text: Set(comment.text.clone()),
            created: Set(comment.created),
        }
        .insert(&self.db)
        .await
        .context("insert comment")?;
        Ok(())
    }

    async fn save(&self, comment: &Comment) -> Result<(), ApiError> {
        // Only the text is editable.
        comments::ActiveModel {
            id: Set(comment.id),
            text: Set(comment.text.clone()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update comment")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = comments::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete comment")?;
        Ok(result.rows_affected > 0)
    }
}

// ── Category repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCategoryRepository {
    pub db: DatabaseConnection,
}

fn category_from_model(m: categories::Model) -> Category {
    Category {
        id: m.id,
        name: m.name,
        description: m.description,
    }
}

fn category_to_active(category: &Category) -> categories::ActiveModel {
    categories::ActiveModel {
        id: Set(category.id),
        name: Set(category.name.clone()),
        description: Set(category.description.clone()),
    }
}

impl CategoryRepository for DbCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>, ApiError> {
        let models = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
            .context("list categories")?;
        Ok(models.into_iter().map(category_from_model).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, ApiError> {
        let model = categories::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find category by id")?;
        Ok(model.map(category_from_model))
    }

    async fn create(&self, category: &Category) -> Result<(), ApiError> {
        category_to_active(category)
            .insert(&self.db)
            .await
            .context("insert category")?;
        Ok(())
    }

    async fn save(&self, category: &Category) -> Result<(), ApiError> {
        category_to_active(category)
            .update(&self.db)
            .await
            .context("update category")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = categories::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete category")?;
        Ok(result.rows_affected > 0)
    }
}

// ── Persistence ───────────────────────────────────────────────────────────────

/// PostgreSQL-backed repositories sharing one connection pool.
#[derive(Clone)]
pub struct DbPersistence {
    pub db: DatabaseConnection,
    pub code_ttl: chrono::Duration,
}

impl Persistence for DbPersistence {
    type Users = DbUserRepository;
    type Codes = DbOneTimeCodeRepository;
    type Posts = DbPostRepository;
    type Comments = DbCommentRepository;
    type Categories = DbCategoryRepository;

    fn users(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    fn codes(&self) -> DbOneTimeCodeRepository {
        DbOneTimeCodeRepository {
            db: self.db.clone(),
            ttl: self.code_ttl,
        }
    }

    fn posts(&self) -> DbPostRepository {
        DbPostRepository {
            db: self.db.clone(),
        }
    }

    fn comments(&self) -> DbCommentRepository {
        DbCommentRepository {
            db: self.db.clone(),
        }
    }

    fn categories(&self) -> DbCategoryRepository {
        DbCategoryRepository {
            db: self.db.clone(),
        }
    }

    async fn ping(&self) -> bool {
        match self.db.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "database ping failed");
                false
            }
        }
    }
}
