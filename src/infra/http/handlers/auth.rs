use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::CookieJar;
use tavola_api_types::{LoginRequest, SESSION_COOKIE, SessionResponse};

use crate::infra::http::{
    auth::{AdminSession, removal_cookie, session_cookie},
    error::ApiError,
    state::AppState,
};

use super::ApiJson;

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = state.sessions.login(&request.password)?;
    let jar = jar.add(session_cookie(issued.token, &state));
    Ok((
        jar,
        Json(SessionResponse {
            expires_at: issued.expires_at,
        }),
    ))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.logout(cookie.value());
    }
    (jar.remove(removal_cookie()), StatusCode::NO_CONTENT)
}

pub async fn session(Extension(session): Extension<AdminSession>) -> impl IntoResponse {
    Json(SessionResponse {
        expires_at: session.expires_at,
    })
}
