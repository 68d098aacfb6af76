//! Records mirrored from persistent storage.

use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use super::pages::PageKey;

/// A page document as it sits in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPage {
    pub key: PageKey,
    pub content: Map<String, Value>,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub body: String,
    pub image: Option<String>,
    pub position: i32,
    pub published: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItemRecord {
    pub id: i64,
    pub category: String,
    pub name: String,
    pub description: String,
    pub price_cents: i32,
    pub available: bool,
    pub position: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
