use uuid::Uuid;

use crate::domain::content::{Comment, CommentView};
use crate::domain::repository::{CommentRepository, PostRepository, UserRepository};
use crate::error::ApiError;
use crate::usecase::access::ensure_author_or_admin;
use crate::usecase::post::author_handles;

fn require_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::MalformedBody("Text is required".to_owned()));
    }
    Ok(())
}

pub struct ListCommentsUseCase<C: CommentRepository> {
    pub comments: C,
}

impl<C: CommentRepository> ListCommentsUseCase<C> {
    pub async fn execute(&self) -> Result<Vec<Comment>, ApiError> {
        self.comments.list().await
    }
}

pub struct GetCommentUseCase<C: CommentRepository> {
    pub comments: C,
}

impl<C: CommentRepository> GetCommentUseCase<C> {
    pub async fn execute(&self, id: Uuid) -> Result<Comment, ApiError> {
        self.comments
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CommentNotFound)
    }
}

// ── Thread of a post ──────────────────────────────────────────────────────────

pub struct ListPostCommentsUseCase<C: CommentRepository, P: PostRepository, U: UserRepository> {
    pub comments: C,
    pub posts: P,
    pub users: U,
}

impl<C, P, U> ListPostCommentsUseCase<C, P, U>
where
    C: CommentRepository,
    P: PostRepository,
    U: UserRepository,
{
    pub async fn execute(&self, post_id: Uuid) -> Result<Vec<CommentView>, ApiError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or(ApiError::PostNotFound)?;
        let comments = self.comments.list_by_post(post_id).await?;

        let authors = author_handles(&self.users, comments.iter().map(|c| c.user_id)).await?;

        Ok(comments
            .into_iter()
            .map(|comment| CommentView {
                author: comment.user_id.and_then(|id| authors.get(&id).cloned()),
                comment,
            })
            .collect())
    }
}

// ── Create ────────────────────────────────────────────────────────────────────

pub struct CreateCommentInput {
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub text: String,
}

pub struct CreateCommentUseCase<C: CommentRepository, P: PostRepository> {
    pub comments: C,
    pub posts: P,
}

impl<C: CommentRepository, P: PostRepository> CreateCommentUseCase<C, P> {
    /// A reply must target a comment on the same post.
    pub async fn execute(
        &self,
        author: Uuid,
        input: CreateCommentInput,
    ) -> Result<Comment, ApiError> {
        require_text(&input.text)?;
        self.posts
            .find_by_id(input.post_id)
            .await?
            .ok_or(ApiError::PostNotFound)?;
        if let Some(parent_id) = input.parent_id {
            let parent = self
                .comments
                .find_by_id(parent_id)
                .await?
                .ok_or(ApiError::CommentNotFound)?;
            if parent.post_id != input.post_id {
                return Err(ApiError::MalformedBody(
                    "Parent comment belongs to another post".to_owned(),
                ));
            }
        }

        let comment = Comment::new(author, input.post_id, input.parent_id, input.text);
        self.comments.create(&comment).await?;
        tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");
        Ok(comment)
    }
}

// ── Update / Delete ───────────────────────────────────────────────────────────

pub struct UpdateCommentUseCase<C: CommentRepository, U: UserRepository> {
    pub comments: C,
    pub users: U,
}

impl<C: CommentRepository, U: UserRepository> UpdateCommentUseCase<C, U> {
    pub async fn execute(&self, caller: Uuid, id: Uuid, text: String) -> Result<Comment, ApiError> {
        let mut comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CommentNotFound)?;
        ensure_author_or_admin(&self.users, caller, comment.user_id).await?;
        require_text(&text)?;

        comment.text = text;
        self.comments.save(&comment).await?;
        Ok(comment)
    }
}

pub struct DeleteCommentUseCase<C: CommentRepository, U: UserRepository> {
    pub comments: C,
    pub users: U,
}

impl<C: CommentRepository, U: UserRepository> DeleteCommentUseCase<C, U> {
    pub async fn execute(&self, caller: Uuid, id: Uuid) -> Result<(), ApiError> {
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CommentNotFound)?;
        ensure_author_or_admin(&self.users, caller, comment.user_id).await?;

        if !self.comments.delete(id).await? {
            return Err(ApiError::CommentNotFound);
        }
        Ok(())
    }
}
