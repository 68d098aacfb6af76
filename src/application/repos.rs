//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::entities::{MenuItemRecord, PostRecord, StoredPage};
use crate::domain::pages::PageKey;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// Whether retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepoError::Unavailable(_) | RepoError::Timeout)
    }
}

#[async_trait]
pub trait ContentRepo: Send + Sync {
    async fn find_page(&self, key: PageKey) -> Result<Option<StoredPage>, RepoError>;

    /// Insert or replace the document for `key`, stamping a fresh `updated_at`.
    async fn save_page(
        &self,
        key: PageKey,
        content: &Map<String, Value>,
    ) -> Result<StoredPage, RepoError>;

    async fn list_pages(&self) -> Result<Vec<StoredPage>, RepoError>;

    async fn ping(&self) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub body: String,
    pub image: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub body: String,
    pub image: Option<String>,
    pub published: bool,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts ordered by position, then id.
    async fn list_posts(&self, published_only: bool) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;

    /// New posts are placed after every existing post.
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: i64) -> Result<(), RepoError>;

    /// Set `position = index` for every listed id in one transaction; unknown ids are skipped.
    async fn reorder_posts(&self, ids: &[i64]) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct MenuItemParams {
    pub category: String,
    pub name: String,
    pub description: String,
    pub price_cents: i32,
    pub available: bool,
}

#[async_trait]
pub trait MenuRepo: Send + Sync {
    async fn list_menu_items(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<MenuItemRecord>, RepoError>;

    async fn find_menu_item(&self, id: i64) -> Result<Option<MenuItemRecord>, RepoError>;

    async fn create_menu_item(&self, params: MenuItemParams) -> Result<MenuItemRecord, RepoError>;

    async fn update_menu_item(
        &self,
        id: i64,
        params: MenuItemParams,
    ) -> Result<MenuItemRecord, RepoError>;

    async fn delete_menu_item(&self, id: i64) -> Result<(), RepoError>;

    async fn reorder_menu_items(&self, ids: &[i64]) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SiteArchiveRepo: Send + Sync {
    /// Replace every page, post and menu item in one transaction.
    async fn replace_site(
        &self,
        pages: &[StoredPage],
        posts: &[PostRecord],
        menu: &[MenuItemRecord],
    ) -> Result<(), RepoError>;
}
