use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use tavola_api_types::{PostCreateRequest, PostReorderRequest, PostUpdateRequest};

use crate::application::posts::PostDraft;
use crate::domain::error::DomainError;
use crate::infra::http::{auth::admin_session, error::ApiError, state::AppState};

use super::{ApiJson, post_response};

/// Published posts for visitors; every post for an admin session.
pub async fn list_posts(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let published_only = admin_session(&state, &jar).is_none();
    let posts = state.posts.list(published_only).await?;
    Ok(Json(posts.into_iter().map(post_response).collect::<Vec<_>>()))
}

pub async fn get_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get(id).await?;
    if !post.published && admin_session(&state, &jar).is_none() {
        return Err(DomainError::not_found("post").into());
    }
    Ok(Json(post_response(post)))
}

pub async fn create_post(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = PostDraft {
        title: request.title,
        slug: request.slug,
        excerpt: request.excerpt,
        body: request.body,
        image: request.image,
        published: request.published,
    };
    let post = state.posts.create(draft).await?;
    Ok((StatusCode::CREATED, Json(post_response(post))))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<PostUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = PostDraft {
        title: request.title,
        slug: Some(request.slug),
        excerpt: request.excerpt,
        body: request.body,
        image: request.image,
        published: request.published,
    };
    let post = state.posts.update(id, draft).await?;
    Ok(Json(post_response(post)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.posts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_posts(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PostReorderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.reorder(&request.posts).await?;
    Ok(Json(posts.into_iter().map(post_response).collect::<Vec<_>>()))
}
