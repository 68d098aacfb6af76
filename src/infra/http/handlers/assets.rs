use std::io::ErrorKind;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{
    HeaderValue, StatusCode,
    header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
};
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::application::error::HttpError;
use crate::infra::{http::state::AppState, uploads::UploadStorageError};

const SOURCE: &str = "infra::http::assets::serve_asset";

/// `GET <public prefix>/{*path}`: stored upload bytes.
pub async fn serve_asset(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    match state.storage().read(&path).await {
        Ok(bytes) => asset_response(&path, bytes),
        Err(UploadStorageError::InvalidPath) => not_found(),
        Err(UploadStorageError::Io(err))
            if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) =>
        {
            not_found()
        }
        Err(err) => {
            error!(
                target = "tavola::http::assets",
                path = %path,
                error = %err,
                "failed to read stored upload"
            );
            HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read uploaded file",
                &err,
            )
            .into_response()
        }
    }
}

fn not_found() -> Response {
    HttpError::new(
        SOURCE,
        StatusCode::NOT_FOUND,
        "Upload not found",
        "The requested upload is not available",
    )
    .into_response()
}

fn asset_response(path: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    // Replaced files keep their path; the `?v=` query busts caches instead.
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=3600"));

    response
}
