use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use serde_json::{Map, Value};

use crate::domain::{collections::ImageCollection, error::DomainError, pages::PageKey};
use crate::infra::http::{error::ApiError, state::AppState};

use super::{ApiJson, page_response};

/// `PUT /api/pages/{key}/collections/{collection}/reorder` with `{ "<field>": [...] }`.
pub async fn reorder(
    State(state): State<AppState>,
    Path((key, collection)): Path<(String, String)>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = resolve(&key, &collection)?;
    let items = ordered_items(collection, body)?;
    let snapshot = state.content.reorder(collection, items).await?;
    Ok(Json(page_response(snapshot)))
}

/// `DELETE /api/pages/{key}/collections/{collection}/{index}`.
pub async fn remove(
    State(state): State<AppState>,
    Path((key, collection, index)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = resolve(&key, &collection)?;
    // A negative or non-numeric index can never address an element.
    let index: usize = index
        .parse()
        .map_err(|_| DomainError::not_found("collection item"))?;
    let snapshot = state.content.remove_at(collection, index).await?;
    Ok(Json(page_response(snapshot)))
}

fn resolve(key: &str, collection: &str) -> Result<ImageCollection, ApiError> {
    let page: PageKey = key.parse()?;
    Ok(ImageCollection::for_page(page, collection)?)
}

fn ordered_items(
    collection: ImageCollection,
    mut body: Map<String, Value>,
) -> Result<Vec<String>, ApiError> {
    let field = collection.field();
    let value = body.remove(field).ok_or_else(|| {
        ApiError::bad_request(
            "Missing ordered list",
            Some(format!("expected a `{field}` array")),
        )
    })?;
    serde_json::from_value(value).map_err(|err| {
        ApiError::bad_request(
            "Ordered list must be an array of strings",
            Some(err.to_string()),
        )
    })
}
