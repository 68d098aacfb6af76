use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use tavola_api_types::{MenuItemRequest, MenuReorderRequest};

use crate::application::repos::MenuItemParams;
use crate::infra::http::{error::ApiError, state::AppState};

use super::{ApiJson, menu_item_response};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MenuQuery {
    category: Option<String>,
}

fn params(request: MenuItemRequest) -> MenuItemParams {
    MenuItemParams {
        category: request.category,
        name: request.name,
        description: request.description,
        price_cents: request.price_cents,
        available: request.available,
    }
}

pub async fn list_menu(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.menu.list(query.category.as_deref()).await?;
    Ok(Json(
        items.into_iter().map(menu_item_response).collect::<Vec<_>>(),
    ))
}

pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.menu.get(id).await?;
    Ok(Json(menu_item_response(item)))
}

pub async fn create_menu_item(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MenuItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.menu.create(params(request)).await?;
    Ok((StatusCode::CREATED, Json(menu_item_response(item))))
}

pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<MenuItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.menu.update(id, params(request)).await?;
    Ok(Json(menu_item_response(item)))
}

pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.menu.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_menu(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MenuReorderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.menu.reorder(&request.items).await?;
    Ok(Json(
        items.into_iter().map(menu_item_response).collect::<Vec<_>>(),
    ))
}
