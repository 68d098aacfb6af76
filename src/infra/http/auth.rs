//! Cookie-based admin session gate.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tavola_api_types::SESSION_COOKIE;
use time::OffsetDateTime;

use super::error::ApiError;
use super::state::AppState;

/// Marker inserted into request and response extensions once a session checks out.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession {
    pub expires_at: OffsetDateTime,
}

/// Reject the request with 401 unless it carries a live session cookie.
///
/// Installed with `route_layer`, so it runs before any extractor of the
/// guarded handlers, multipart bodies included.
pub async fn require_admin_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(session) = admin_session(&state, &jar) else {
        return ApiError::unauthorized().into_response();
    };

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;
    response.extensions_mut().insert(session);
    response
}

/// Session carried by `jar`, if any.
pub fn admin_session(state: &AppState, jar: &CookieJar) -> Option<AdminSession> {
    let token = jar.get(SESSION_COOKIE)?;
    state
        .sessions
        .validate(token.value())
        .ok()
        .map(|expires_at| AdminSession { expires_at })
}

pub fn session_cookie(token: String, state: &AppState) -> Cookie<'static> {
    let max_age = time::Duration::try_from(state.sessions.ttl()).unwrap_or(time::Duration::DAY);
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(state.secure_cookie)
        .max_age(max_age)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookie
}
