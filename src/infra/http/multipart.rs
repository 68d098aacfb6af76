//! Reads an upload-and-merge multipart body into staged parts.

use axum::http::StatusCode;
use axum_extra::extract::Multipart;
use axum_extra::extract::multipart::MultipartError;
use futures::TryStreamExt;
use tracing::{debug, error};

use crate::application::uploads::{StagedUpload, UploadSubmission};
use crate::infra::uploads::{UploadStorage, UploadStorageError};

use super::error::ApiError;

const SOURCE: &str = "tavola::http::multipart";
const CONTENT_FIELD: &str = "content";
const BINDINGS_FIELD: &str = "bindings";

/// Collect the `content` and `bindings` text fields and stream every other part into staging.
///
/// Staged files are dropped (and removed) with the submission if anything later fails.
pub async fn read_submission(
    multipart: &mut Multipart,
    storage: &UploadStorage,
) -> Result<UploadSubmission, ApiError> {
    let mut submission = UploadSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            CONTENT_FIELD | BINDINGS_FIELD => {
                let slot = if name == CONTENT_FIELD {
                    &mut submission.content
                } else {
                    &mut submission.bindings
                };
                if slot.is_some() {
                    return Err(ApiError::bad_request(
                        "Duplicate multipart field",
                        Some(format!("`{name}` may only appear once")),
                    ));
                }
                *slot = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {
                let original_name = field
                    .file_name()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string);
                let content_type = field.content_type().map(str::to_string);

                let stream = field.map_err(|err| {
                    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        UploadStorageError::PayloadTooLarge {
                            source: Box::new(err),
                        }
                    } else {
                        UploadStorageError::PayloadStream {
                            source: Box::new(err),
                        }
                    }
                });

                match storage.stage_stream(stream).await {
                    Ok(staged) => submission.files.push(StagedUpload {
                        field: name,
                        original_name,
                        content_type,
                        staged,
                    }),
                    // An empty file input in a form still submits a part.
                    Err(UploadStorageError::EmptyPayload) if original_name.is_none() => {
                        debug!(target = SOURCE, field = %name, "skipping empty file part");
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }

    Ok(submission)
}

fn multipart_error(err: MultipartError) -> ApiError {
    let status = err.status();
    error!(
        target = SOURCE,
        status = status.as_u16(),
        error = %err,
        "failed to read multipart payload"
    );
    ApiError::rejected(status, err.body_text())
}
