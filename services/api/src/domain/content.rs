//! Forum content: posts, comments and categories.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub url: Option<String>,
    pub text: Option<String>,
    pub user_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub is_stickied: bool,
    pub is_visible: bool,
    pub is_deleted: bool,
}

impl Post {
    /// New visible post. The slug is derived from `title`.
    pub fn new(
        title: String,
        url: Option<String>,
        text: Option<String>,
        user_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            slug: slugify(&title),
            title,
            url,
            text,
            user_id: Some(user_id),
            category_id,
            created_at: now,
            updated: now,
            is_stickied: false,
            is_visible: true,
            is_deleted: false,
        }
    }

    /// Shown on public listings and slug lookups.
    pub fn is_public(&self) -> bool {
        self.is_visible && !self.is_deleted
    }

    pub fn toggle(&mut self, flag: PostFlag) {
        match flag {
            PostFlag::Visible => self.is_visible = !self.is_visible,
            PostFlag::Deleted => self.is_deleted = !self.is_deleted,
            PostFlag::Stickied => self.is_stickied = !self.is_stickied,
        }
    }
}

/// Lower-case slug: alphanumeric runs joined by `-`.
///
/// ```
/// use hackers_api::domain::content::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Rust 2024 -- edition  "), "rust-2024-edition");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for word in title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.extend(word.chars().flat_map(char::to_lowercase));
    }
    slug
}

/// Moderation flag flipped by the toggle endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFlag {
    Visible,
    Deleted,
    Stickied,
}

/// Fields an author may change on a post. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_deleted: Option<bool>,
}

impl PostUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.url.is_none()
            && self.text.is_none()
            && self.category_id.is_none()
            && self.is_deleted.is_none()
    }

    /// Apply the update, re-deriving the slug when the title changes.
    pub fn apply(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.slug = slugify(&title);
            post.title = title;
        }
        if let Some(url) = self.url {
            post.url = Some(url);
        }
        if let Some(text) = self.text {
            post.text = Some(text);
        }
        if let Some(category_id) = self.category_id {
            post.category_id = Some(category_id);
        }
        if let Some(is_deleted) = self.is_deleted {
            post.is_deleted = is_deleted;
        }
        post.updated = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostSort {
    #[default]
    Created,
    Updated,
    Title,
}

impl PostSort {
    /// Unknown keys fall back to creation time.
    pub fn parse(key: &str) -> Self {
        match key {
            "title" => Self::Title,
            "updated" => Self::Updated,
            _ => Self::Created,
        }
    }
}

/// Listing parameters for public posts. Stickied posts always come first.
#[derive(Debug, Clone)]
pub struct PostQuery {
    /// 1-based.
    pub page: u64,
    pub limit: u64,
    pub sort: PostSort,
    pub descending: bool,
    /// Case-insensitive substring of the title.
    pub filter: String,
    pub category_id: Option<Uuid>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort: PostSort::Created,
            descending: true,
            filter: String::new(),
            category_id: None,
        }
    }
}

impl PostQuery {
    /// Clamp page and limit into range.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub total: u64,
    pub items: Vec<T>,
}

/// Listing row: a post with its author's handle and comment count.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub post: Post,
    pub author: Option<String>,
    pub total_comments: u64,
}

/// Post resolved for display by slug.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub author: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub post_id: Uuid,
    /// Comment this one replies to; `None` at top level.
    pub parent_id: Option<Uuid>,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl Comment {
    pub fn new(user_id: Uuid, post_id: Uuid, parent_id: Option<Uuid>, text: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: Some(user_id),
            post_id,
            parent_id,
            text,
            created: Utc::now(),
        }
    }
}

/// Comment with its author's handle.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name,
            description,
        }
    }
}
