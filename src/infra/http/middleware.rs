use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::infra::telemetry::ADMIN_WRITES_TOTAL;

use super::auth::AdminSession;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Tag the request with an id, reusing the caller's `x-request-id` when it is a UUID,
/// and echo it on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .unwrap_or_else(Uuid::new_v4)
        .to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// What part of the site a request path touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Page {
        key: &'a str,
        collection: Option<&'a str>,
    },
    Posts,
    Menu,
    Auth,
    Health,
    Asset,
}

impl<'a> Scope<'a> {
    pub fn of(path: &'a str) -> Self {
        let mut segments = path.trim_start_matches('/').split('/');
        match (segments.next(), segments.next()) {
            (Some("api"), Some("pages")) => {
                let key = segments.next().unwrap_or_default();
                let collection = match segments.next() {
                    Some("collections") => segments.next().filter(|name| !name.is_empty()),
                    _ => None,
                };
                Scope::Page { key, collection }
            }
            (Some("api"), Some("posts")) => Scope::Posts,
            (Some("api"), Some("menu")) => Scope::Menu,
            (Some("api"), Some("auth")) => Scope::Auth,
            (Some("_health"), _) => Scope::Health,
            _ => Scope::Asset,
        }
    }

    pub fn resource(&self) -> &'static str {
        match self {
            Scope::Page {
                collection: Some(_),
                ..
            } => "collection",
            Scope::Page { .. } => "page",
            Scope::Posts => "posts",
            Scope::Menu => "menu",
            Scope::Auth => "auth",
            Scope::Health => "health",
            Scope::Asset => "asset",
        }
    }

    fn page(&self) -> &'a str {
        match *self {
            Scope::Page { key, .. } => key,
            _ => "",
        }
    }

    fn collection(&self) -> &'a str {
        match *self {
            Scope::Page {
                collection: Some(collection),
                ..
            } => collection,
            _ => "",
        }
    }
}

fn is_write(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let scope = Scope::of(uri.path());
    let admin = response.extensions().get::<AdminSession>().is_some();
    let elapsed_ms = start.elapsed().as_millis();

    if admin && is_write(&method) {
        counter!(
            ADMIN_WRITES_TOTAL,
            "resource" => scope.resource(),
            "status" => status_class(status)
        )
        .increment(1);
        if status.is_success() {
            info!(
                target = "tavola::http::admin",
                status = status.as_u16(),
                method = %method,
                resource = scope.resource(),
                page = scope.page(),
                collection = scope.collection(),
                elapsed_ms = elapsed_ms,
                request_id = request_id,
                "admin write applied",
            );
        }
    }

    if status.is_client_error() || status.is_server_error() {
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "tavola::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                resource = scope.resource(),
                page = scope.page(),
                collection = scope.collection(),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                admin = admin,
                "request failed",
            );
        } else {
            warn!(
                target = "tavola::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                resource = scope.resource(),
                page = scope.page(),
                collection = scope.collection(),
                source = source,
                detail = %detail,
                request_id = request_id,
                admin = admin,
                "client request error",
            );
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_names_page_and_collection() {
        assert_eq!(
            Scope::of("/api/pages/homepage/collections/customers/2"),
            Scope::Page {
                key: "homepage",
                collection: Some("customers")
            }
        );
        let page = Scope::of("/api/pages/about/upload");
        assert_eq!(
            page,
            Scope::Page {
                key: "about",
                collection: None
            }
        );
        assert_eq!(page.resource(), "page");
        assert_eq!(
            Scope::of("/api/pages/homepage/collections/carousel/reorder").resource(),
            "collection"
        );
    }

    #[test]
    fn scope_covers_records_and_assets() {
        assert_eq!(Scope::of("/api/posts/reorder"), Scope::Posts);
        assert_eq!(Scope::of("/api/menu/7"), Scope::Menu);
        assert_eq!(Scope::of("/api/auth/login"), Scope::Auth);
        assert_eq!(Scope::of("/_health"), Scope::Health);
        assert_eq!(Scope::of("/uploads/content/homepage/logo.png"), Scope::Asset);
        assert_eq!(Scope::of("/uploads/x").page(), "");
    }

    #[test]
    fn writes_and_status_classes() {
        assert!(is_write(&Method::DELETE));
        assert!(!is_write(&Method::GET));
        assert_eq!(status_class(StatusCode::NO_CONTENT), "2xx");
        assert_eq!(status_class(StatusCode::SERVICE_UNAVAILABLE), "5xx");
    }
}
