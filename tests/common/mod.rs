#![allow(dead_code)]

use std::collections::HashMap;
use std::num::{NonZeroU32, NonZeroU64};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Map, Value};
use tempfile::TempDir;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;
use tracing::level_filters::LevelFilter;

use tavola::application::repos::{
    ContentRepo, CreatePostParams, MenuItemParams, MenuRepo, PostsRepo, RepoError,
    UpdatePostParams,
};
use tavola::application::sessions::hash_password;
use tavola::config::{
    AdminSettings, ContentSettings, DatabaseSettings, LogFormat, LoggingSettings, ServerSettings,
    Settings, UploadSettings,
};
use tavola::domain::entities::{MenuItemRecord, PostRecord, StoredPage};
use tavola::domain::merge::MergeStrategy;
use tavola::domain::pages::PageKey;
use tavola::infra::http::{AppState, build_router};

pub const ADMIN_PASSWORD: &str = "open sesame";

// ----- Content -----

#[derive(Default)]
pub struct MemoryContent {
    pages: Mutex<HashMap<PageKey, StoredPage>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryContent {
    pub async fn seed(&self, key: PageKey, content: Value) {
        let Value::Object(content) = content else {
            panic!("seeded content must be an object");
        };
        self.pages.lock().await.insert(
            key,
            StoredPage {
                key,
                content,
                updated_at: OffsetDateTime::now_utc(),
            },
        );
    }

    pub async fn stored(&self, key: PageKey) -> Option<Map<String, Value>> {
        self.pages
            .lock()
            .await
            .get(&key)
            .map(|page| page.content.clone())
    }

    /// Serialized form of the stored document, for byte-for-byte comparisons.
    pub async fn stored_bytes(&self, key: PageKey) -> Option<String> {
        self.stored(key)
            .await
            .map(|content| serde_json::to_string(&content).expect("encode stored page"))
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentRepo for MemoryContent {
    async fn find_page(&self, key: PageKey) -> Result<Option<StoredPage>, RepoError> {
        Ok(self.pages.lock().await.get(&key).cloned())
    }

    async fn save_page(
        &self,
        key: PageKey,
        content: &Map<String, Value>,
    ) -> Result<StoredPage, RepoError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("content store is offline".into()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        let page = StoredPage {
            key,
            content: content.clone(),
            updated_at: OffsetDateTime::now_utc(),
        };
        self.pages.lock().await.insert(key, page.clone());
        Ok(page)
    }

    async fn list_pages(&self) -> Result<Vec<StoredPage>, RepoError> {
        let mut pages: Vec<_> = self.pages.lock().await.values().cloned().collect();
        pages.sort_by_key(|page| page.key.as_str());
        Ok(pages)
    }

    async fn ping(&self) -> Result<(), RepoError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("content store is offline".into()));
        }
        Ok(())
    }
}

// ----- Posts -----

#[derive(Default)]
pub struct MemoryPosts {
    posts: Mutex<Vec<PostRecord>>,
    next_id: AtomicI64,
}

#[async_trait]
impl PostsRepo for MemoryPosts {
    async fn list_posts(&self, published_only: bool) -> Result<Vec<PostRecord>, RepoError> {
        let mut posts: Vec<_> = self
            .posts
            .lock()
            .await
            .iter()
            .filter(|post| !published_only || post.published)
            .cloned()
            .collect();
        posts.sort_by_key(|post| (post.position, post.id));
        Ok(posts)
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        Ok(self
            .posts
            .lock()
            .await
            .iter()
            .find(|post| post.id == id)
            .cloned())
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        Ok(self
            .posts
            .lock()
            .await
            .iter()
            .find(|post| post.slug == slug)
            .cloned())
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().await;
        if posts.iter().any(|post| post.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".into(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let position = posts.iter().map(|post| post.position + 1).max().unwrap_or(0);
        let record = PostRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            slug: params.slug,
            title: params.title,
            excerpt: params.excerpt,
            body: params.body,
            image: params.image,
            position,
            published: params.published,
            created_at: now,
            updated_at: now,
        };
        posts.push(record.clone());
        Ok(record)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().await;
        let post = posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.slug = params.slug;
        post.title = params.title;
        post.excerpt = params.excerpt;
        post.body = params.body;
        post.image = params.image;
        post.published = params.published;
        post.updated_at = OffsetDateTime::now_utc();
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut posts = self.posts.lock().await;
        let before = posts.len();
        posts.retain(|post| post.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn reorder_posts(&self, ids: &[i64]) -> Result<(), RepoError> {
        let mut posts = self.posts.lock().await;
        for (index, id) in ids.iter().enumerate() {
            if let Some(post) = posts.iter_mut().find(|post| post.id == *id) {
                post.position = index as i32;
            }
        }
        Ok(())
    }
}

// ----- Menu -----

#[derive(Default)]
pub struct MemoryMenu {
    items: Mutex<Vec<MenuItemRecord>>,
    next_id: AtomicI64,
}

#[async_trait]
impl MenuRepo for MemoryMenu {
    async fn list_menu_items(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<MenuItemRecord>, RepoError> {
        let mut items: Vec<_> = self
            .items
            .lock()
            .await
            .iter()
            .filter(|item| category.is_none_or(|category| item.category == category))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.position.cmp(&b.position))
                .then(a.id.cmp(&b.id))
        });
        Ok(items)
    }

    async fn find_menu_item(&self, id: i64) -> Result<Option<MenuItemRecord>, RepoError> {
        Ok(self
            .items
            .lock()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned())
    }

    async fn create_menu_item(&self, params: MenuItemParams) -> Result<MenuItemRecord, RepoError> {
        let mut items = self.items.lock().await;
        let now = OffsetDateTime::now_utc();
        let position = items
            .iter()
            .filter(|item| item.category == params.category)
            .map(|item| item.position + 1)
            .max()
            .unwrap_or(0);
        let record = MenuItemRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            category: params.category,
            name: params.name,
            description: params.description,
            price_cents: params.price_cents,
            available: params.available,
            position,
            created_at: now,
            updated_at: now,
        };
        items.push(record.clone());
        Ok(record)
    }

    async fn update_menu_item(
        &self,
        id: i64,
        params: MenuItemParams,
    ) -> Result<MenuItemRecord, RepoError> {
        let mut items = self.items.lock().await;
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(RepoError::NotFound)?;
        item.category = params.category;
        item.name = params.name;
        item.description = params.description;
        item.price_cents = params.price_cents;
        item.available = params.available;
        item.updated_at = OffsetDateTime::now_utc();
        Ok(item.clone())
    }

    async fn delete_menu_item(&self, id: i64) -> Result<(), RepoError> {
        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn reorder_menu_items(&self, ids: &[i64]) -> Result<(), RepoError> {
        let mut items = self.items.lock().await;
        for (index, id) in ids.iter().enumerate() {
            if let Some(item) = items.iter_mut().find(|item| item.id == *id) {
                item.position = index as i32;
            }
        }
        Ok(())
    }
}

// ----- Harness -----

pub fn settings(upload_dir: PathBuf, merge_strategy: MergeStrategy) -> Settings {
    let mut digest = [0_u8; 32];
    hex::decode_to_slice(hash_password(ADMIN_PASSWORD), &mut digest).expect("hex digest");

    Settings {
        server: ServerSettings {
            addr: "127.0.0.1:0".parse().expect("addr"),
            graceful_shutdown: Duration::from_secs(1),
        },
        logging: LoggingSettings {
            level: LevelFilter::WARN,
            format: LogFormat::Compact,
        },
        database: DatabaseSettings {
            url: None,
            max_connections: NonZeroU32::new(1).expect("non-zero"),
        },
        uploads: UploadSettings {
            directory: upload_dir,
            public_prefix: "/uploads".to_string(),
            max_request_bytes: NonZeroU64::new(1024 * 1024).expect("non-zero"),
        },
        admin: AdminSettings {
            password_sha256: Some(digest),
            session_ttl: Duration::from_secs(600),
            secure_cookie: false,
        },
        content: ContentSettings { merge_strategy },
    }
}

pub struct Harness {
    pub router: Router,
    pub content: Arc<MemoryContent>,
    pub posts: Arc<MemoryPosts>,
    pub menu: Arc<MemoryMenu>,
    dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_strategy(MergeStrategy::Shallow)
    }

    pub fn with_strategy(strategy: MergeStrategy) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = settings(dir.path().join("uploads"), strategy);
        let content = Arc::new(MemoryContent::default());
        let posts = Arc::new(MemoryPosts::default());
        let menu = Arc::new(MemoryMenu::default());
        let state = AppState::new(&settings, content.clone(), posts.clone(), menu.clone())
            .expect("app state");

        Self {
            router: build_router(state),
            content,
            posts,
            menu,
            dir,
        }
    }

    pub fn upload_root(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn staging_entries(&self) -> usize {
        std::fs::read_dir(self.upload_root().join(".staging"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Regular files under the upload root, staging excluded, as sorted relative paths.
    pub fn placed_files(&self) -> Vec<String> {
        fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.file_name().is_some_and(|name| name == ".staging") {
                    continue;
                }
                if path.is_dir() {
                    walk(root, &path, out);
                } else if let Ok(relative) = path.strip_prefix(root) {
                    out.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
        }

        let root = self.upload_root();
        let mut out = Vec::new();
        walk(&root, &root, &mut out);
        out.sort();
        out
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn send_raw(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond")
    }

    /// Log in and return the `Cookie` header value for the session.
    pub async fn login(&self) -> String {
        let request = json_request(
            Method::POST,
            "/api/auth/login",
            None,
            &serde_json::json!({ "password": ADMIN_PASSWORD }),
        );
        let response = self.send_raw(request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("session cookie");
        set_cookie
            .split(';')
            .next()
            .expect("cookie pair")
            .to_string()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build")
}

pub fn bare(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request should build")
}

pub fn json_request(
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: &Value,
) -> Request<Body> {
    raw_json_request(method, uri, cookie, body.to_string())
}

pub fn raw_json_request(
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: String,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request should build")
}

/// Hand-built `multipart/form-data` body.
pub struct MultipartBody {
    boundary: &'static str,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "tavola-test-boundary",
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        let mut builder = Request::builder().method(method).uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", self.boundary),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
            .body(Body::from(self.body))
            .expect("request should build")
    }
}

/// Strip the `?v=` cache buster from an asset URL.
pub fn without_version(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}
