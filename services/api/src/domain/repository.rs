//! Persistence and delivery ports consumed by the use cases.
//!
//! Repository methods return `Send` futures so handlers generic over
//! [`Persistence`] stay spawnable by axum. Implementations may use `async fn`.

use std::collections::HashMap;
use std::future::Future;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::domain::content::{Category, Comment, Page, Post, PostQuery};
use crate::domain::types::{MailMessage, OneTimeCode, User};
use crate::error::ApiError;

/// Credential store.
pub trait UserRepository: Send + Sync {
    fn find_by_handle(
        &self,
        handle: &str,
    ) -> impl Future<Output = Result<Option<User>, ApiError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, ApiError>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = Result<Option<User>, ApiError>> + Send;

    fn list(&self) -> impl Future<Output = Result<Vec<User>, ApiError>> + Send;

    /// Users among `ids` that exist, in no particular order.
    fn find_by_ids(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = Result<Vec<User>, ApiError>> + Send;

    fn create(&self, user: &User) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Persist every mutable field of `user`, last write wins.
    fn save(&self, user: &User) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Returns `true` if a row was deleted.
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<bool, ApiError>> + Send;
}

/// One-time-code store. Records older than the store TTL are never returned.
pub trait OneTimeCodeRepository: Send + Sync {
    fn create(&self, code: &OneTimeCode) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Exact `(email, code)` match among unexpired records.
    fn find_by(
        &self,
        email: &str,
        code: &str,
    ) -> impl Future<Output = Result<Option<OneTimeCode>, ApiError>> + Send;

    /// Remove every record holding `code`. Returns the number removed.
    fn delete_by_code(&self, code: &str) -> impl Future<Output = Result<u64, ApiError>> + Send;

    /// Purge records past the TTL. Returns the number removed.
    fn delete_expired(&self) -> impl Future<Output = Result<u64, ApiError>> + Send;
}

pub trait PostRepository: Send + Sync {
    fn find_by_id(&self, id: Uuid) -> impl Future<Output = Result<Option<Post>, ApiError>> + Send;

    fn find_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Post>, ApiError>> + Send;

    /// Public posts only (visible, not deleted), stickied first.
    fn list(
        &self,
        query: &PostQuery,
    ) -> impl Future<Output = Result<Page<Post>, ApiError>> + Send;

    fn create(&self, post: &Post) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn save(&self, post: &Post) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Returns `true` if a row was deleted. The post's comments go with it.
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<bool, ApiError>> + Send;
}

pub trait CommentRepository: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<Comment>, ApiError>> + Send;

    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Comment>, ApiError>> + Send;

    /// Oldest first.
    fn list_by_post(
        &self,
        post_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Comment>, ApiError>> + Send;

    /// Comment count per post. Posts without comments are absent.
    fn count_by_posts(
        &self,
        post_ids: &[Uuid],
    ) -> impl Future<Output = Result<HashMap<Uuid, u64>, ApiError>> + Send;

    fn create(&self, comment: &Comment) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn save(&self, comment: &Comment) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = Result<bool, ApiError>> + Send;
}

pub trait CategoryRepository: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<Category>, ApiError>> + Send;

    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Category>, ApiError>> + Send;

    fn create(&self, category: &Category) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn save(&self, category: &Category) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Posts in the category are kept and lose their category.
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<bool, ApiError>> + Send;
}

/// Bundle of repositories sharing one backend.
pub trait Persistence: Clone + Send + Sync + 'static {
    type Users: UserRepository;
    type Codes: OneTimeCodeRepository + 'static;
    type Posts: PostRepository;
    type Comments: CommentRepository;
    type Categories: CategoryRepository;

    fn users(&self) -> Self::Users;
    fn codes(&self) -> Self::Codes;
    fn posts(&self) -> Self::Posts;
    fn comments(&self) -> Self::Comments;
    fn categories(&self) -> Self::Categories;

    /// Readiness probe.
    fn ping(&self) -> impl Future<Output = bool> + Send;
}

/// Outbound email. Fire-and-forget: delivery failures are logged by the
/// implementation and never reach the caller.
pub trait Mailer: Send + Sync {
    fn send(&self, address: &str, message: MailMessage);
}

/// Binary image storage returning a stable public URL.
pub trait ImageStore: Send + Sync {
    fn upload(&self, bytes: Vec<u8>) -> BoxFuture<'_, Result<String, ApiError>>;
}
