use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use futures::future::BoxFuture;
use uuid::Uuid;

use hackers_api::domain::content::{Category, Comment, Page, Post, PostQuery, PostSort};
use hackers_api::domain::password::PasswordHasher;
use hackers_api::domain::repository::{
    CategoryRepository, CommentRepository, ImageStore, Mailer, OneTimeCodeRepository,
    Persistence, PostRepository, UserRepository,
};
use hackers_api::domain::types::{
    MailMessage, ONE_TIME_CODE_TTL_SECS, OneTimeCode, User, UserRole,
};
use hackers_api::error::ApiError;
use hackers_api::state::AppState;
use hackers_auth_types::token::TokenIssuer;
use hackers_testing::auth::test_issuer;

/// Cheapest bcrypt cost; keeps the suite fast.
pub const TEST_BCRYPT_COST: u32 = 4;

pub const TEST_RESET_LINK_BASE: &str = "http://localhost:3000/verify/reset-password";

pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(TEST_BCRYPT_COST)
}

pub fn test_tokens() -> TokenIssuer {
    test_issuer()
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockUserRepo {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepo {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a shared handle to the stored users for post-execution inspection.
    pub fn users_handle(&self) -> Arc<Mutex<Vec<User>>> {
        Arc::clone(&self.users)
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    /// Insert a user whose password is `password`.
    pub async fn seed(&self, handle: &str, email: &str, password: &str) -> User {
        let hash = test_hasher().hash(password).await.unwrap();
        let user = User::new(handle.to_owned(), email.to_owned(), hash);
        self.users.lock().unwrap().push(user.clone());
        user
    }

    /// Insert an admin account whose password is `password`.
    pub async fn seed_admin(&self, handle: &str, email: &str, password: &str) -> User {
        let mut admin = self.seed(handle, email, password).await;
        admin.role = UserRole::Admin;
        let mut users = self.users.lock().unwrap();
        if let Some(stored) = users.iter_mut().find(|u| u.id == admin.id) {
            stored.role = UserRole::Admin;
        }
        admin
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.handle == handle)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.get(id))
    }

    async fn list(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, ApiError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), ApiError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(anyhow::anyhow!("user {} does not exist", user.id).into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }
}

// ── MockCodeRepo ─────────────────────────────────────────────────────────────

/// In-memory one-time-code store that honours a TTL the way the real one does.
#[derive(Clone)]
pub struct MockCodeRepo {
    pub codes: Arc<Mutex<Vec<OneTimeCode>>>,
    pub ttl: Duration,
}

impl Default for MockCodeRepo {
    fn default() -> Self {
        Self {
            codes: Arc::default(),
            ttl: Duration::seconds(ONE_TIME_CODE_TTL_SECS as i64),
        }
    }
}

impl MockCodeRepo {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn codes_handle(&self) -> Arc<Mutex<Vec<OneTimeCode>>> {
        Arc::clone(&self.codes)
    }

    /// Move every stored code `by` into the past.
    pub fn age(&self, by: Duration) {
        for code in self.codes.lock().unwrap().iter_mut() {
            code.created_at -= by;
        }
    }

    /// Age every code just past the TTL.
    pub fn expire_all(&self) {
        self.age(self.ttl + Duration::seconds(1));
    }

    pub fn latest_for(&self, email: &str) -> Option<OneTimeCode> {
        self.codes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|c| c.email == email)
            .cloned()
    }

    fn is_live(&self, code: &OneTimeCode) -> bool {
        code.created_at > Utc::now() - self.ttl
    }
}

impl OneTimeCodeRepository for MockCodeRepo {
    async fn create(&self, code: &OneTimeCode) -> Result<(), ApiError> {
        self.codes.lock().unwrap().push(code.clone());
        Ok(())
    }

    async fn find_by(&self, email: &str, code: &str) -> Result<Option<OneTimeCode>, ApiError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.email == email && c.code == code && self.is_live(c))
            .cloned())
    }

    async fn delete_by_code(&self, code: &str) -> Result<u64, ApiError> {
        let mut codes = self.codes.lock().unwrap();
        let before = codes.len();
        codes.retain(|c| c.code != code);
        Ok((before - codes.len()) as u64)
    }

    async fn delete_expired(&self) -> Result<u64, ApiError> {
        let cutoff = Utc::now() - self.ttl;
        let mut codes = self.codes.lock().unwrap();
        let before = codes.len();
        codes.retain(|c| c.created_at > cutoff);
        Ok((before - codes.len()) as u64)
    }
}

// ── MockPostRepo ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockPostRepo {
    pub posts: Arc<Mutex<Vec<Post>>>,
}

impl MockPostRepo {
    pub fn seed(&self, title: &str, user_id: Option<Uuid>) -> Post {
        let mut post = Post::new(
            title.to_owned(),
            None,
            Some("body".to_owned()),
            user_id.unwrap_or_else(Uuid::new_v4),
            None,
        );
        post.user_id = user_id;
        self.posts.lock().unwrap().push(post.clone());
        post
    }

    pub fn get(&self, id: Uuid) -> Option<Post> {
        self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned()
    }

    /// Apply `change` to the stored post.
    pub fn edit(&self, id: Uuid, change: impl FnOnce(&mut Post)) {
        if let Some(post) = self.posts.lock().unwrap().iter_mut().find(|p| p.id == id) {
            change(post);
        }
    }
}

impl PostRepository for MockPostRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, ApiError> {
        Ok(self.get(id))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, ApiError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn list(&self, query: &PostQuery) -> Result<Page<Post>, ApiError> {
        let needle = query.filter.to_lowercase();
        let mut matches: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_public())
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .filter(|p| query.category_id.is_none() || p.category_id == query.category_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            let by_key = match query.sort {
                PostSort::Created => a.created_at.cmp(&b.created_at),
                PostSort::Updated => a.updated.cmp(&b.updated),
                PostSort::Title => a.title.cmp(&b.title),
            };
            let by_key = if query.descending { by_key.reverse() } else { by_key };
            b.is_stickied.cmp(&a.is_stickied).then(by_key)
        });
        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();
        Ok(Page { total, items })
    }

    async fn create(&self, post: &Post) -> Result<(), ApiError> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(())
    }

    async fn save(&self, post: &Post) -> Result<(), ApiError> {
        let mut posts = self.posts.lock().unwrap();
        match posts.iter_mut().find(|p| p.id == post.id) {
            Some(stored) => {
                *stored = post.clone();
                Ok(())
            }
            None => Err(anyhow::anyhow!("post {} does not exist", post.id).into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() < before)
    }
}

// ── MockCommentRepo ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockCommentRepo {
    pub comments: Arc<Mutex<Vec<Comment>>>,
}

impl MockCommentRepo {
    pub fn seed(&self, user_id: Uuid, post_id: Uuid, text: &str) -> Comment {
        let comment = Comment::new(user_id, post_id, None, text.to_owned());
        self.comments.lock().unwrap().push(comment.clone());
        comment
    }

    pub fn get(&self, id: Uuid) -> Option<Comment> {
        self.comments
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }
}

impl CommentRepository for MockCommentRepo {
    async fn list(&self) -> Result<Vec<Comment>, ApiError> {
        Ok(self.comments.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, ApiError> {
        Ok(self.get(id))
    }

    async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, ApiError> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn count_by_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, ApiError> {
        let mut counts = HashMap::new();
        for comment in self.comments.lock().unwrap().iter() {
            if post_ids.contains(&comment.post_id) {
                *counts.entry(comment.post_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn create(&self, comment: &Comment) -> Result<(), ApiError> {
        self.comments.lock().unwrap().push(comment.clone());
        Ok(())
    }

    async fn save(&self, comment: &Comment) -> Result<(), ApiError> {
        let mut comments = self.comments.lock().unwrap();
        match comments.iter_mut().find(|c| c.id == comment.id) {
            Some(stored) => {
                stored.text = comment.text.clone();
                Ok(())
            }
            None => Err(anyhow::anyhow!("comment {} does not exist", comment.id).into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut comments = self.comments.lock().unwrap();
        let before = comments.len();
        comments.retain(|c| c.id != id);
        Ok(comments.len() < before)
    }
}

// ── MockCategoryRepo ─────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockCategoryRepo {
    pub categories: Arc<Mutex<Vec<Category>>>,
}

impl MockCategoryRepo {
    pub fn seed(&self, name: &str) -> Category {
        let category = Category::new(name.to_owned(), None);
        self.categories.lock().unwrap().push(category.clone());
        category
    }
}

impl CategoryRepository for MockCategoryRepo {
    async fn list(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, ApiError> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn create(&self, category: &Category) -> Result<(), ApiError> {
        self.categories.lock().unwrap().push(category.clone());
        Ok(())
    }

    async fn save(&self, category: &Category) -> Result<(), ApiError> {
        let mut categories = self.categories.lock().unwrap();
        match categories.iter_mut().find(|c| c.id == category.id) {
            Some(stored) => {
                *stored = category.clone();
                Ok(())
            }
            None => Err(anyhow::anyhow!("category {} does not exist", category.id).into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut categories = self.categories.lock().unwrap();
        let before = categories.len();
        categories.retain(|c| c.id != id);
        Ok(categories.len() < before)
    }
}

// ── MockPersistence ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockPersistence {
    pub users: MockUserRepo,
    pub codes: MockCodeRepo,
    pub posts: MockPostRepo,
    pub comments: MockCommentRepo,
    pub categories: MockCategoryRepo,
}

impl Persistence for MockPersistence {
    type Users = MockUserRepo;
    type Codes = MockCodeRepo;
    type Posts = MockPostRepo;
    type Comments = MockCommentRepo;
    type Categories = MockCategoryRepo;

    fn users(&self) -> MockUserRepo {
        self.users.clone()
    }

    fn codes(&self) -> MockCodeRepo {
        self.codes.clone()
    }

    fn posts(&self) -> MockPostRepo {
        self.posts.clone()
    }

    fn comments(&self) -> MockCommentRepo {
        self.comments.clone()
    }

    fn categories(&self) -> MockCategoryRepo {
        self.categories.clone()
    }

    async fn ping(&self) -> bool {
        true
    }
}

// ── RecordingMailer ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<(String, MailMessage)>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<(String, MailMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, address: &str, message: MailMessage) {
        self.sent
            .lock()
            .unwrap()
            .push((address.to_owned(), message));
    }
}

// ── MemoryImageStore ─────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryImageStore {
    pub uploads: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ImageStore for MemoryImageStore {
    fn upload(&self, bytes: Vec<u8>) -> BoxFuture<'_, Result<String, ApiError>> {
        Box::pin(async move {
            let mut uploads = self.uploads.lock().unwrap();
            uploads.push(bytes);
            Ok(format!("https://images.test/{}.png", uploads.len()))
        })
    }
}

// ── App fixture ──────────────────────────────────────────────────────────────

pub struct TestApp {
    pub persistence: MockPersistence,
    pub mailer: RecordingMailer,
    pub images: MemoryImageStore,
    pub state: AppState<MockPersistence>,
}

impl TestApp {
    pub fn new() -> Self {
        let persistence = MockPersistence::default();
        let mailer = RecordingMailer::default();
        let images = MemoryImageStore::default();
        let state = AppState {
            persistence: persistence.clone(),
            tokens: test_tokens(),
            hasher: test_hasher(),
            mailer: Arc::new(mailer.clone()),
            images: Arc::new(images.clone()),
            reset_link_base: TEST_RESET_LINK_BASE.to_owned(),
        };
        Self {
            persistence,
            mailer,
            images,
            state,
        }
    }
}
