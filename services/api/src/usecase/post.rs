use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::domain::content::{Page, Post, PostDetail, PostFlag, PostQuery, PostSummary, PostUpdate};
use crate::domain::repository::{
    CategoryRepository, CommentRepository, PostRepository, UserRepository,
};
use crate::error::ApiError;
use crate::usecase::access::{ensure_admin, ensure_author_or_admin};

/// Resolve handles for every distinct author id in one lookup.
pub(crate) async fn author_handles<U: UserRepository>(
    users: &U,
    ids: impl IntoIterator<Item = Option<Uuid>>,
) -> Result<HashMap<Uuid, String>, ApiError> {
    let ids: Vec<Uuid> = ids
        .into_iter()
        .flatten()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    Ok(users
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.handle))
        .collect())
}

fn require_text(value: &str, what: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::MalformedBody(format!("{what} is required")));
    }
    Ok(())
}

/// Fails when `post.slug` is empty or held by another post.
async fn ensure_slug_free<P: PostRepository>(posts: &P, post: &Post) -> Result<(), ApiError> {
    if post.slug.is_empty() {
        return Err(ApiError::MalformedBody(
            "Title must contain a letter or digit".to_owned(),
        ));
    }
    match posts.find_by_slug(&post.slug).await? {
        Some(other) if other.id != post.id => Err(ApiError::SlugTaken(post.slug.clone())),
        _ => Ok(()),
    }
}

async fn ensure_category<C: CategoryRepository>(
    categories: &C,
    category_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(id) = category_id {
        categories
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CategoryNotFound)?;
    }
    Ok(())
}

// ── Get by id ─────────────────────────────────────────────────────────────────

pub struct GetPostUseCase<P: PostRepository> {
    pub posts: P,
}

impl<P: PostRepository> GetPostUseCase<P> {
    pub async fn execute(&self, id: Uuid) -> Result<Post, ApiError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or(ApiError::PostNotFound)
    }
}

// ── List ──────────────────────────────────────────────────────────────────────

pub struct ListPostsUseCase<P: PostRepository, U: UserRepository, C: CommentRepository> {
    pub posts: P,
    pub users: U,
    pub comments: C,
}

impl<P, U, C> ListPostsUseCase<P, U, C>
where
    P: PostRepository,
    U: UserRepository,
    C: CommentRepository,
{
    pub async fn execute(&self, query: &PostQuery) -> Result<Page<PostSummary>, ApiError> {
        let page = self.posts.list(query).await?;
        let ids: Vec<Uuid> = page.items.iter().map(|p| p.id).collect();
        let counts = self.comments.count_by_posts(&ids).await?;
        let authors = author_handles(&self.users, page.items.iter().map(|p| p.user_id)).await?;

        let items = page
            .items
            .into_iter()
            .map(|post| PostSummary {
                author: post.user_id.and_then(|id| authors.get(&id).cloned()),
                total_comments: counts.get(&post.id).copied().unwrap_or(0),
                post,
            })
            .collect();
        Ok(Page {
            total: page.total,
            items,
        })
    }
}

// ── Get by slug ───────────────────────────────────────────────────────────────

pub struct GetPostBySlugUseCase<P: PostRepository, U: UserRepository, C: CategoryRepository> {
    pub posts: P,
    pub users: U,
    pub categories: C,
}

impl<P, U, C> GetPostBySlugUseCase<P, U, C>
where
    P: PostRepository,
    U: UserRepository,
    C: CategoryRepository,
{
    /// Hidden and deleted posts read as missing.
    pub async fn execute(&self, slug: &str) -> Result<PostDetail, ApiError> {
        let post = self
            .posts
            .find_by_slug(slug)
            .await?
            .filter(Post::is_public)
            .ok_or(ApiError::PostNotFound)?;

        let author = match post.user_id {
            Some(id) => self.users.find_by_id(id).await?.map(|u| u.handle),
            None => None,
        };
        let category = match post.category_id {
            Some(id) => self.categories.find_by_id(id).await?.map(|c| c.name),
            None => None,
        };
        Ok(PostDetail {
            post,
            author,
            category,
        })
    }
}

// ── Create ────────────────────────────────────────────────────────────────────

pub struct CreatePostInput {
    pub title: String,
    pub url: Option<String>,
    pub text: Option<String>,
    pub category_id: Option<Uuid>,
}

pub struct CreatePostUseCase<P: PostRepository, C: CategoryRepository> {
    pub posts: P,
    pub categories: C,
}

impl<P: PostRepository, C: CategoryRepository> CreatePostUseCase<P, C> {
    pub async fn execute(&self, author: Uuid, input: CreatePostInput) -> Result<Post, ApiError> {
        require_text(&input.title, "Title")?;
        ensure_category(&self.categories, input.category_id).await?;

        let post = Post::new(input.title, input.url, input.text, author, input.category_id);
        ensure_slug_free(&self.posts, &post).await?;
        self.posts.create(&post).await?;

        tracing::info!(post_id = %post.id, user_id = %author, slug = %post.slug, "post created");
        Ok(post)
    }
}

// ── Update ────────────────────────────────────────────────────────────────────

pub struct UpdatePostUseCase<P: PostRepository, U: UserRepository, C: CategoryRepository> {
    pub posts: P,
    pub users: U,
    pub categories: C,
}

impl<P, U, C> UpdatePostUseCase<P, U, C>
where
    P: PostRepository,
    U: UserRepository,
    C: CategoryRepository,
{
    pub async fn execute(
        &self,
        caller: Uuid,
        id: Uuid,
        update: PostUpdate,
    ) -> Result<Post, ApiError> {
        if update.is_empty() {
            return Err(ApiError::MissingData);
        }
        let mut post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(ApiError::PostNotFound)?;
        ensure_author_or_admin(&self.users, caller, post.user_id).await?;

        if let Some(title) = &update.title {
            require_text(title, "Title")?;
        }
        ensure_category(&self.categories, update.category_id).await?;

        let retitled = update.title.is_some();
        update.apply(&mut post);
        if retitled {
            ensure_slug_free(&self.posts, &post).await?;
        }
        self.posts.save(&post).await?;
        Ok(post)
    }
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub struct DeletePostUseCase<P: PostRepository, U: UserRepository> {
    pub posts: P,
    pub users: U,
}

impl<P: PostRepository, U: UserRepository> DeletePostUseCase<P, U> {
    pub async fn execute(&self, caller: Uuid, id: Uuid) -> Result<(), ApiError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(ApiError::PostNotFound)?;
        ensure_author_or_admin(&self.users, caller, post.user_id).await?;

        if !self.posts.delete(id).await? {
            return Err(ApiError::PostNotFound);
        }
        tracing::info!(post_id = %id, user_id = %caller, "post deleted");
        Ok(())
    }
}

// ── Moderation toggles ────────────────────────────────────────────────────────

pub struct TogglePostFlagUseCase<P: PostRepository, U: UserRepository> {
    pub posts: P,
    pub users: U,
}

impl<P: PostRepository, U: UserRepository> TogglePostFlagUseCase<P, U> {
    /// Admin only. Returns the post with the flag flipped.
    pub async fn execute(&self, caller: Uuid, id: Uuid, flag: PostFlag) -> Result<Post, ApiError> {
        let mut post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(ApiError::PostNotFound)?;
        ensure_admin(&self.users, caller).await?;

        post.toggle(flag);
        self.posts.save(&post).await?;
        tracing::info!(post_id = %id, user_id = %caller, ?flag, "post flag toggled");
        Ok(post)
    }
}
