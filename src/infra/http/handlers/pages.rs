use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Path, State};
use axum::http::{Request, header::CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::Multipart;
use tavola_api_types::{PageUpdateRequest, UploadResponse};

use crate::domain::pages::PageKey;
use crate::infra::http::{error::ApiError, multipart::read_submission, state::AppState};

use super::{page_response, upload_response};

pub async fn get_page(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let key: PageKey = key.parse()?;
    let snapshot = state.content.load(key).await?;
    Ok(Json(page_response(snapshot)))
}

/// `PUT /api/pages/{key}`: a JSON `{ content }` merge, or a multipart upload-and-merge.
pub async fn update_page(
    State(state): State<AppState>,
    Path(key): Path<String>,
    request: Request<Body>,
) -> Result<Response, ApiError> {
    let key: PageKey = key.parse()?;

    if is_multipart(&request) {
        return upload(&state, key, request)
            .await
            .map(IntoResponse::into_response);
    }

    let body = Bytes::from_request(request, &state)
        .await
        .map_err(|rejection| ApiError::rejected(rejection.status(), rejection.body_text()))?;
    let update: PageUpdateRequest = serde_json::from_slice(&body)
        .map_err(|err| ApiError::bad_request("Malformed JSON body", Some(err.to_string())))?;

    let snapshot = state.content.update(key, update.content).await?;
    Ok(Json(page_response(snapshot)).into_response())
}

/// `POST /api/pages/{key}/upload`.
pub async fn upload_page(
    State(state): State<AppState>,
    Path(key): Path<String>,
    request: Request<Body>,
) -> Result<impl IntoResponse, ApiError> {
    let key: PageKey = key.parse()?;
    upload(&state, key, request).await
}

async fn upload(
    state: &AppState,
    key: PageKey,
    request: Request<Body>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|rejection| ApiError::rejected(rejection.status(), rejection.body_text()))?;
    let submission = read_submission(&mut multipart, state.storage()).await?;
    let outcome = state.uploads.submit(key, submission).await?;
    Ok(Json(upload_response(outcome)))
}

fn is_multipart(request: &Request<Body>) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}
