use std::error::Error as StdError;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tavola_api_types::{ApiErrorBody, ApiErrorMessage};

use crate::application::{
    content::ContentError, error::ErrorReport, menu::MenuError, posts::PostError,
    repos::RepoError, sessions::AuthError, uploads::UploadMergeError,
};
use crate::domain::error::DomainError;
use crate::infra::uploads::UploadStorageError;

const SOURCE: &str = "infra::http::api";

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const UNAVAILABLE: &str = "store_unavailable";
    pub const REPO: &str = "repo_error";
    pub const PERSISTENCE: &str = "persistence_error";
    pub const UPLOAD: &str = "upload_error";
    pub const INTERNAL: &str = "internal_error";
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            report: None,
        }
    }

    /// Keep the full `source()` chain of `error` for the response log.
    fn caused_by(mut self, error: &dyn StdError) -> Self {
        self.report = Some(ErrorReport::from_error(SOURCE, self.status, error));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Admin session required",
            None,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn payload_too_large(hint: Option<String>) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::PAYLOAD_TOO_LARGE,
            "Request body exceeds the configured limit",
            hint,
        )
    }

    pub fn internal(hint: Option<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL,
            "Unexpected error occurred",
            hint,
        )
    }

    /// Map an extractor rejection by its status code.
    pub fn rejected(status: StatusCode, detail: String) -> Self {
        match status {
            StatusCode::PAYLOAD_TOO_LARGE => Self::payload_too_large(Some(detail)),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => Self::new(
                status,
                codes::BAD_REQUEST,
                "Unsupported content type",
                Some(detail),
            ),
            _ => Self::bad_request("Malformed request body", Some(detail)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                SOURCE,
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message)
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let api = match &err {
            DomainError::NotFound { .. } => Self::new(
                StatusCode::NOT_FOUND,
                codes::NOT_FOUND,
                "Resource not found",
                Some(err.to_string()),
            ),
            DomainError::Validation { .. } => {
                Self::bad_request("Request could not be processed", Some(err.to_string()))
            }
            DomainError::Invariant { .. } => Self::internal(None),
        };
        api.caused_by(&err)
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        let api = match &err {
            RepoError::NotFound => Self::not_found("Resource not found"),
            RepoError::Duplicate { constraint } => Self::new(
                StatusCode::CONFLICT,
                codes::DUPLICATE,
                "Duplicate record",
                Some(constraint.clone()),
            ),
            RepoError::InvalidInput { message } => Self::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_INPUT,
                "Invalid input",
                Some(message.clone()),
            ),
            RepoError::Timeout => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "Database timeout",
                None,
            ),
            RepoError::Unavailable(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::UNAVAILABLE,
                "Service temporarily unavailable",
                None,
            ),
            RepoError::Persistence(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Persistence error",
                None,
            ),
        };
        api.caused_by(&err)
    }
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Domain(err) => err.into(),
            ContentError::Repo(err) => err.into(),
        }
    }
}

impl From<PostError> for ApiError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::Domain(err) => err.into(),
            PostError::Repo(err) => err.into(),
        }
    }
}

impl From<MenuError> for ApiError {
    fn from(err: MenuError) -> Self {
        match err {
            MenuError::Domain(err) => err.into(),
            MenuError::Repo(err) => err.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let api = match err {
            AuthError::InvalidPassword => Self::new(
                StatusCode::UNAUTHORIZED,
                codes::UNAUTHORIZED,
                "Invalid password",
                None,
            ),
            AuthError::NotConfigured => Self::new(
                StatusCode::UNAUTHORIZED,
                codes::UNAUTHORIZED,
                "Admin login is disabled",
                Some("set admin.password_sha256".to_string()),
            ),
            AuthError::InvalidSession => Self::unauthorized(),
        };
        api.caused_by(&err)
    }
}

impl From<UploadStorageError> for ApiError {
    fn from(err: UploadStorageError) -> Self {
        let api = match &err {
            UploadStorageError::PayloadTooLarge { .. } | UploadStorageError::SizeOverflow => {
                Self::payload_too_large(None)
            }
            UploadStorageError::PayloadStream { source } => {
                Self::bad_request("Failed to read uploaded file", Some(source.to_string()))
            }
            UploadStorageError::EmptyPayload => {
                Self::bad_request("Uploaded file is empty", None)
            }
            UploadStorageError::InvalidPath => {
                Self::bad_request("Invalid upload destination", None)
            }
            UploadStorageError::Io(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::UPLOAD,
                "Failed to stage uploaded file",
                None,
            ),
        };
        api.caused_by(&err)
    }
}

impl From<UploadMergeError> for ApiError {
    fn from(err: UploadMergeError) -> Self {
        match err {
            UploadMergeError::Invalid(err) => err.into(),
            UploadMergeError::Content(err) => err.into(),
            UploadMergeError::Placement {
                ref destination,
                ref orphaned,
                ..
            } => {
                let hint = if orphaned.is_empty() {
                    format!("could not place {destination}")
                } else {
                    format!(
                        "could not place {destination}; already placed: {}",
                        orphaned.join(", ")
                    )
                };
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    codes::UPLOAD,
                    "Failed to store uploaded files",
                    Some(hint),
                )
                .caused_by(&err)
            }
            UploadMergeError::Persistence {
                ref placed,
                ref source,
            } => {
                let status = if source.is_transient() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                let paths: Vec<&str> = placed.iter().map(|file| file.path.as_str()).collect();
                Self::new(
                    status,
                    codes::PERSISTENCE,
                    "Files were stored but the page could not be saved; retry the request",
                    Some(format!("placed: {}", paths.join(", "))),
                )
                .caused_by(&err)
            }
        }
    }
}
