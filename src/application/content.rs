//! Content Store service: page documents, merges and image collections.

use std::sync::Arc;

use metrics::counter;
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::application::repos::{ContentRepo, RepoError};
use crate::domain::{
    collections::{self, ImageCollection},
    error::DomainError,
    merge::MergeStrategy,
    pages::{PageContent, PageKey},
};
use crate::infra::telemetry::{CONTENT_WRITES_TOTAL, REORDERS_TOTAL};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A page document as served to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub key: PageKey,
    pub content: Map<String, Value>,
    /// `None` while the page has never been written.
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Clone)]
pub struct ContentService {
    repo: Arc<dyn ContentRepo>,
    merge: MergeStrategy,
}

impl ContentService {
    pub fn new(repo: Arc<dyn ContentRepo>, merge: MergeStrategy) -> Self {
        Self { repo, merge }
    }

    pub fn merge_strategy(&self) -> MergeStrategy {
        self.merge
    }

    /// Stored document for `key`, or its built-in default when nothing was saved yet.
    pub async fn load(&self, key: PageKey) -> Result<PageSnapshot, ContentError> {
        match self.repo.find_page(key).await? {
            Some(stored) => Ok(PageSnapshot {
                key,
                content: stored.content,
                updated_at: Some(stored.updated_at),
            }),
            None => Ok(PageSnapshot {
                key,
                content: PageContent::default_for(key).to_map()?,
                updated_at: None,
            }),
        }
    }

    /// Merge `fragment` into `current` and validate the result, without saving.
    pub fn merged_document(
        &self,
        current: &PageSnapshot,
        fragment: Map<String, Value>,
    ) -> Result<Map<String, Value>, ContentError> {
        let merged = self.merge.apply(&current.content, fragment);
        canonicalize(current.key, merged)
    }

    /// Merge a JSON fragment into the stored document and persist it.
    pub async fn update(
        &self,
        key: PageKey,
        fragment: Map<String, Value>,
    ) -> Result<PageSnapshot, ContentError> {
        let current = self.load(key).await?;
        let document = self.merged_document(&current, fragment)?;
        self.save_document(key, document).await
    }

    /// Persist an already validated document.
    pub async fn save_document(
        &self,
        key: PageKey,
        document: Map<String, Value>,
    ) -> Result<PageSnapshot, ContentError> {
        let stored = self.repo.save_page(key, &document).await?;
        counter!(CONTENT_WRITES_TOTAL, "page" => key.as_str()).increment(1);
        info!(
            target = "tavola::content",
            page = %key,
            strategy = %self.merge,
            "page content saved"
        );
        Ok(PageSnapshot {
            key,
            content: stored.content,
            updated_at: Some(stored.updated_at),
        })
    }

    pub async fn collection(
        &self,
        collection: ImageCollection,
    ) -> Result<Vec<String>, ContentError> {
        let page = self.load(collection.page()).await?;
        read_collection(&page.content, collection)
    }

    /// Replace a collection with `items` verbatim.
    ///
    /// Only duplicates are refused; the set of items is not compared with
    /// what was stored before.
    pub async fn reorder(
        &self,
        collection: ImageCollection,
        items: Vec<String>,
    ) -> Result<PageSnapshot, ContentError> {
        collections::ensure_unique(&items)?;

        let key = collection.page();
        let current = self.load(key).await?;
        let count = items.len();
        let mut document = current.content;
        write_collection(&mut document, collection, items);
        let document = canonicalize(key, document)?;

        let snapshot = self.save_document(key, document).await?;
        counter!(REORDERS_TOTAL, "collection" => collection.as_str()).increment(1);
        debug!(
            target = "tavola::content",
            collection = %collection,
            items = count,
            "collection reordered"
        );
        Ok(snapshot)
    }

    /// Drop the element at `index`; out-of-range indexes leave the page untouched.
    pub async fn remove_at(
        &self,
        collection: ImageCollection,
        index: usize,
    ) -> Result<PageSnapshot, ContentError> {
        let key = collection.page();
        let current = self.load(key).await?;
        let mut items = read_collection(&current.content, collection)?;
        let removed = collections::remove_at(&mut items, index)?;

        let mut document = current.content;
        write_collection(&mut document, collection, items);
        let document = canonicalize(key, document)?;

        let snapshot = self.save_document(key, document).await?;
        debug!(
            target = "tavola::content",
            collection = %collection,
            index,
            removed = %removed,
            "collection item removed"
        );
        Ok(snapshot)
    }

    pub async fn ping(&self) -> Result<(), ContentError> {
        self.repo.ping().await.map_err(ContentError::from)
    }
}

/// Validate `document` as the typed content of `key` and return its canonical encoding.
pub fn canonicalize(
    key: PageKey,
    document: Map<String, Value>,
) -> Result<Map<String, Value>, ContentError> {
    let typed = PageContent::from_value(key, Value::Object(document))?;
    Ok(typed.to_map()?)
}

fn read_collection(
    document: &Map<String, Value>,
    collection: ImageCollection,
) -> Result<Vec<String>, ContentError> {
    let Some(value) = document
        .get(collection.section())
        .and_then(|section| section.get(collection.field()))
    else {
        return Ok(Vec::new());
    };

    serde_json::from_value(value.clone()).map_err(|err| {
        ContentError::Domain(DomainError::invariant(format!(
            "stored {collection} collection is not a list of strings: {err}"
        )))
    })
}

fn write_collection(
    document: &mut Map<String, Value>,
    collection: ImageCollection,
    items: Vec<String>,
) {
    let section = document
        .entry(collection.section())
        .or_insert_with(|| Value::Object(Map::new()));
    if !section.is_object() {
        *section = Value::Object(Map::new());
    }
    if let Value::Object(fields) = section {
        fields.insert(
            collection.field().to_string(),
            Value::Array(items.into_iter().map(Value::String).collect()),
        );
    }
}
