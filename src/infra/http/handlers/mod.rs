//! Route handlers grouped by resource.

pub mod assets;
pub mod auth;
pub mod collections;
pub mod health;
pub mod menu;
pub mod pages;
pub mod posts;

use axum::extract::FromRequest;
use serde_json::Value;
use tavola_api_types::{
    MenuItemResponse, PageResponse, PlacedFileResponse, PostResponse, UploadResponse,
};

use crate::application::{
    content::PageSnapshot,
    uploads::{PlacedFile, UploadOutcome},
};
use crate::domain::entities::{MenuItemRecord, PostRecord};

use super::error::ApiError;

/// `Json` with rejections reported in the API error format.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub(crate) fn page_response(snapshot: PageSnapshot) -> PageResponse {
    PageResponse {
        page_key: snapshot.key.to_string(),
        content: Value::Object(snapshot.content),
        updated_at: snapshot.updated_at,
    }
}

pub(crate) fn upload_response(outcome: UploadOutcome) -> UploadResponse {
    UploadResponse {
        page: page_response(outcome.page),
        placed: outcome.placed.into_iter().map(placed_response).collect(),
    }
}

fn placed_response(file: PlacedFile) -> PlacedFileResponse {
    PlacedFileResponse {
        field: file.field,
        path: file.path,
        url: file.url,
    }
}

pub(crate) fn post_response(post: PostRecord) -> PostResponse {
    PostResponse {
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

pub(crate) fn menu_item_response(item: MenuItemRecord) -> MenuItemResponse {
    MenuItemResponse {
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
