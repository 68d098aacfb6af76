//! Server-side halves of the collections the editor works on.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;
use tavola_api_types::{MenuItemResponse, PageResponse, PostResponse, order_body};

use crate::client::{CliError, Ctx};

/// Where a collection lives on the server.
#[async_trait]
pub trait CollectionSync<T: Send + Sync>: Send + Sync {
    /// Authoritative collection as currently stored.
    async fn fetch(&self) -> Result<Vec<T>, CliError>;

    /// Replace the stored order with `order`.
    async fn replace_order(&self, order: &[T]) -> Result<(), CliError>;

    /// Remove `item`, which sat at `index` when the change was made.
    async fn remove(&self, index: usize, item: &T) -> Result<(), CliError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionTarget {
    /// Image URLs inside a page document, removed by position.
    PageImages {
        page: String,
        collection: String,
        field: &'static str,
    },
    Posts,
    /// Menu items, optionally narrowed to one category.
    Menu { category: Option<String> },
}

/// A collection reached over the admin API.
#[derive(Debug, Clone)]
pub struct HttpCollection<T> {
    ctx: Ctx,
    target: CollectionTarget,
    marker: PhantomData<fn() -> T>,
}

impl<T> HttpCollection<T> {
    pub fn target(&self) -> &CollectionTarget {
        &self.target
    }
}

/// Array field that holds a named image collection.
pub fn collection_field(collection: &str) -> Option<&'static str> {
    match collection {
        "customers" => Some("logos"),
        "carousel" => Some("images"),
        _ => None,
    }
}

impl HttpCollection<String> {
    pub fn page_images(ctx: Ctx, page: &str, collection: &str) -> Result<Self, CliError> {
        let field = collection_field(collection).ok_or_else(|| {
            CliError::InvalidInput(format!(
                "unknown collection `{collection}` (expected customers or carousel)"
            ))
        })?;
        Ok(Self {
            ctx,
            target: CollectionTarget::PageImages {
                page: page.to_string(),
                collection: collection.to_string(),
                field,
            },
            marker: PhantomData,
        })
    }

    fn page_parts(&self) -> Result<(&str, &str, &'static str), CliError> {
        match &self.target {
            CollectionTarget::PageImages {
                page,
                collection,
                field,
            } => Ok((page, collection, *field)),
            other => Err(CliError::InvalidInput(format!(
                "{other:?} is not an image collection"
            ))),
        }
    }
}

impl HttpCollection<i64> {
    pub fn posts(ctx: Ctx) -> Self {
        Self {
            ctx,
            target: CollectionTarget::Posts,
            marker: PhantomData,
        }
    }

    pub fn menu(ctx: Ctx, category: Option<String>) -> Self {
        Self {
            ctx,
            target: CollectionTarget::Menu { category },
            marker: PhantomData,
        }
    }
}

#[async_trait]
impl CollectionSync<String> for HttpCollection<String> {
    async fn fetch(&self) -> Result<Vec<String>, CliError> {
        let (page, collection, field) = self.page_parts()?;
        let response: PageResponse = self
            .ctx
            .get_json(&format!("api/pages/{page}"), None)
            .await?;
        let items = response
            .content
            .get(collection)
            .and_then(|section| section.get(field))
            .cloned()
            .unwrap_or_else(|| json!([]));
        serde_json::from_value(items).map_err(|err| {
            CliError::Server(format!("`{collection}.{field}` is not a list of strings: {err}"))
        })
    }

    async fn replace_order(&self, order: &[String]) -> Result<(), CliError> {
        let (page, collection, field) = self.page_parts()?;
        self.ctx
            .send_unit(
                Method::PUT,
                &format!("api/pages/{page}/collections/{collection}/reorder"),
                Some(&order_body(field, order)),
            )
            .await
    }

    async fn remove(&self, index: usize, _item: &String) -> Result<(), CliError> {
        let (page, collection, _) = self.page_parts()?;
        self.ctx
            .send_unit(
                Method::DELETE,
                &format!("api/pages/{page}/collections/{collection}/{index}"),
                None,
            )
            .await
    }
}

#[async_trait]
impl CollectionSync<i64> for HttpCollection<i64> {
    async fn fetch(&self) -> Result<Vec<i64>, CliError> {
        match &self.target {
            CollectionTarget::Posts => {
                let posts: Vec<PostResponse> = self.ctx.get_json("api/posts", None).await?;
                Ok(posts.into_iter().map(|post| post.id).collect())
            }
            CollectionTarget::Menu { category } => {
                let query: Vec<(&str, String)> = category
                    .iter()
                    .map(|category| ("category", category.clone()))
                    .collect();
                let items: Vec<MenuItemResponse> =
                    self.ctx.get_json("api/menu", Some(&query)).await?;
                Ok(items.into_iter().map(|item| item.id).collect())
            }
            CollectionTarget::PageImages { .. } => Err(CliError::InvalidInput(
                "image collections are addressed by URL".into(),
            )),
        }
    }

    async fn replace_order(&self, order: &[i64]) -> Result<(), CliError> {
        let (path, field) = self.record_route()?;
        self.ctx
            .send_unit(
                Method::PUT,
                &format!("{path}/reorder"),
                Some(&order_body(field, order)),
            )
            .await
    }

    async fn remove(&self, _index: usize, item: &i64) -> Result<(), CliError> {
        let (path, _) = self.record_route()?;
        self.ctx
            .send_unit(Method::DELETE, &format!("{path}/{item}"), None)
            .await
    }
}

impl HttpCollection<i64> {
    fn record_route(&self) -> Result<(&'static str, &'static str), CliError> {
        match &self.target {
            CollectionTarget::Posts => Ok(("api/posts", "posts")),
            CollectionTarget::Menu { .. } => Ok(("api/menu", "items")),
            CollectionTarget::PageImages { .. } => Err(CliError::InvalidInput(
                "image collections are addressed by URL".into(),
            )),
        }
    }
}
