//! Import/export of site content as a TOML archive.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::info;

use crate::{
    application::{
        content::canonicalize,
        error::AppError,
        repos::{ContentRepo, MenuRepo, PostsRepo, SiteArchiveRepo},
    },
    domain::{
        entities::{MenuItemRecord, PostRecord, StoredPage},
        error::DomainError,
        pages::PageKey,
    },
    infra::error::InfraError,
};

const ARCHIVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub pages: usize,
    pub posts: usize,
    pub menu_items: usize,
}

pub async fn export_site(
    content: &dyn ContentRepo,
    posts: &dyn PostsRepo,
    menu: &dyn MenuRepo,
    path: &Path,
) -> Result<ArchiveSummary, AppError> {
    let archive = SiteArchive {
        version: ARCHIVE_VERSION,
        pages: content
            .list_pages()
            .await?
            .into_iter()
            .map(PageEntry::try_from)
            .collect::<Result<_, _>>()?,
        posts: posts
            .list_posts(false)
            .await?
            .into_iter()
            .map(PostEntry::from)
            .collect(),
        menu: menu
            .list_menu_items(None)
            .await?
            .into_iter()
            .map(MenuEntry::from)
            .collect(),
    };
    let summary = archive.summary();

    let encoded = encode_archive(archive)?;
    tokio::fs::write(path, encoded)
        .await
        .map_err(InfraError::from)?;

    info!(
        target = "tavola::site",
        path = %path.display(),
        pages = summary.pages,
        posts = summary.posts,
        menu_items = summary.menu_items,
        "site exported"
    );
    Ok(summary)
}

pub async fn import_site(
    target: &dyn SiteArchiveRepo,
    path: &Path,
) -> Result<ArchiveSummary, AppError> {
    let data = tokio::fs::read_to_string(path)
        .await
        .map_err(InfraError::from)?;
    let (pages, posts, menu) = decode_archive(&data)?;
    let summary = ArchiveSummary {
        pages: pages.len(),
        posts: posts.len(),
        menu_items: menu.len(),
    };

    target.replace_site(&pages, &posts, &menu).await?;

    info!(
        target = "tavola::site",
        path = %path.display(),
        pages = summary.pages,
        posts = summary.posts,
        menu_items = summary.menu_items,
        "site imported"
    );
    Ok(summary)
}

fn encode_archive(mut archive: SiteArchive) -> Result<String, AppError> {
    archive.normalize();
    toml::to_string_pretty(&archive)
        .map_err(|err| InfraError::archive(format!("failed to encode archive: {err}")).into())
}

type DecodedArchive = (Vec<StoredPage>, Vec<PostRecord>, Vec<MenuItemRecord>);

/// Parse an archive and validate every page against its typed schema.
fn decode_archive(data: &str) -> Result<DecodedArchive, AppError> {
    let mut archive: SiteArchive = toml::from_str(data)
        .map_err(|err| DomainError::validation(format!("invalid archive: {err}")))?;
    if archive.version != ARCHIVE_VERSION {
        return Err(DomainError::validation(format!(
            "unsupported archive version {} (expected {ARCHIVE_VERSION})",
            archive.version
        ))
        .into());
    }
    archive.normalize();

    let now = OffsetDateTime::now_utc();
    let mut pages = Vec::with_capacity(archive.pages.len());
    for entry in archive.pages {
        let key: PageKey = entry.key.parse().map_err(|_| {
            DomainError::validation(format!("archive names unknown page `{}`", entry.key))
        })?;
        let document: Map<String, Value> = serde_json::from_str(&entry.content)
            .map_err(|err| DomainError::validation(format!("page `{key}`: {err}")))?;
        let content = canonicalize(key, document).map_err(|err| {
            DomainError::validation(format!("page `{key}` does not validate: {err}"))
        })?;
        pages.push(StoredPage {
            key,
            content,
            updated_at: entry.updated_at.unwrap_or(now),
        });
    }

    let posts = archive
        .posts
        .into_iter()
        .map(|post| PostRecord {
            id: post.id,
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            body: post.body,
            image: post.image,
            position: post.position,
            published: post.published,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
        .collect();

    let menu = archive
        .menu
        .into_iter()
        .map(|item| MenuItemRecord {
            id: item.id,
            category: item.category,
            name: item.name,
            description: item.description,
            price_cents: item.price_cents,
            available: item.available,
            position: item.position,
            created_at: item.created_at,
            updated_at: item.updated_at,
        })
        .collect();

    Ok((pages, posts, menu))
}

#[derive(Debug, Serialize, Deserialize)]
struct SiteArchive {
    version: u32,
    #[serde(default)]
    pages: Vec<PageEntry>,
    #[serde(default)]
    posts: Vec<PostEntry>,
    #[serde(default)]
    menu: Vec<MenuEntry>,
}

impl SiteArchive {
    fn normalize(&mut self) {
        self.pages.sort_by(|a, b| a.key.cmp(&b.key));
        self.posts
            .sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));
        self.menu.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.position.cmp(&b.position))
                .then(a.id.cmp(&b.id))
        });
    }

    fn summary(&self) -> ArchiveSummary {
        ArchiveSummary {
            pages: self.pages.len(),
            posts: self.posts.len(),
            menu_items: self.menu.len(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PageEntry {
    key: String,
    /// Page document encoded as JSON.
    content: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    updated_at: Option<OffsetDateTime>,
}

impl TryFrom<StoredPage> for PageEntry {
    type Error = AppError;

    fn try_from(page: StoredPage) -> Result<Self, Self::Error> {
        let content = serde_json::to_string(&page.content)
            .map_err(|err| AppError::unexpected(format!("failed to encode page: {err}")))?;
        Ok(Self {
            key: page.key.to_string(),
            content,
            updated_at: Some(page.updated_at),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PostEntry {
    id: i64,
    slug: String,
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    body: String,
    image: Option<String>,
    position: i32,
    published: bool,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl From<PostRecord> for PostEntry {
    fn from(post: PostRecord) -> Self {
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            body: post.body,
            image: post.image,
            position: post.position,
            published: post.published,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MenuEntry {
    id: i64,
    category: String,
    name: String,
    #[serde(default)]
    description: String,
    price_cents: i32,
    available: bool,
    position: i32,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl From<MenuItemRecord> for MenuEntry {
    fn from(item: MenuItemRecord) -> Self {
        Self {
            id: item.id,
            category: item.category,
            name: item.name,
            description: item.description,
            price_cents: item.price_cents,
            available: item.available,
            position: item.position,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}
