//! JSON routes that run session operations on behalf of the browser.
//!
//! Each request gets its own `SessionManager` over the request's token store;
//! whatever the operation writes to the store goes back as `Set-Cookie`.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::models::{LoginCredentials, OAuthProvider, RegisterCredentials, UpdateProfileData};
use crate::session::SessionManager;
use crate::state::AppState;
use crate::utils::http_helpers::{with_store_cookies, HTTPError};

/// Registers session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/session/state", get(session_state))
        .route("/session/login", post(login))
        .route("/session/register", post(register))
        .route("/session/logout", post(logout))
        .route("/session/refresh", post(refresh))
        .route("/session/profile", get(get_profile).put(update_profile))
        .route(
            "/session/sessions",
            get(list_sessions).delete(revoke_other_sessions),
        )
        .route("/session/sessions/:id", delete(revoke_session))
        .route("/session/oauth/:provider", get(start_oauth))
        .route("/session/oauth/unlink/:provider", delete(unlink_provider))
}

fn respond(manager: &SessionManager, response: impl IntoResponse) -> Response {
    with_store_cookies(manager.store().as_ref(), response)
}

/// The error recorded on the session, or `fallback` if there is none.
fn failure(manager: &SessionManager, status: StatusCode, fallback: &str) -> HTTPError {
    let state = manager.state();
    HTTPError::new(status, state.error().unwrap_or(fallback))
}

fn parse_provider(provider: &str) -> Result<OAuthProvider, HTTPError> {
    provider
        .parse()
        .map_err(|_| HTTPError::new(StatusCode::BAD_REQUEST, "Invalid OAuth provider"))
}

async fn session_state(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let manager = state.session_for(&headers);
    let status = manager.initialize().await;
    let body = json!({ "status": status, "state": manager.state() });
    respond(&manager, Json(body))
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(credentials): Json<LoginCredentials>,
) -> Response {
    let manager = state.session_for(&headers);
    let outcome = match manager.login(&credentials).await {
        Some(profile) => Ok(Json(profile)),
        None => Err(failure(&manager, StatusCode::UNAUTHORIZED, "Login failed")),
    };
    respond(&manager, outcome)
}

async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(credentials): Json<RegisterCredentials>,
) -> Response {
    let manager = state.session_for(&headers);
    let outcome = match manager.register(&credentials).await {
        Some(profile) => Ok(Json(profile)),
        None => Err(failure(&manager, StatusCode::BAD_REQUEST, "Registration failed")),
    };
    respond(&manager, outcome)
}

/// Always succeeds; local tokens are cleared whatever the auth server says.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let manager = state.session_for(&headers);
    let success = manager.logout().await;
    respond(&manager, Json(json!({ "success": success })))
}

async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let manager = state.session_for(&headers);
    let outcome = if manager.refresh_session().await {
        Ok(Json(manager.state()))
    } else {
        Err(HTTPError::new(
            StatusCode::UNAUTHORIZED,
            "Failed to refresh session",
        ))
    };
    respond(&manager, outcome)
}

async fn get_profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let manager = state.session_for(&headers);
    let outcome = manager.get_profile().await.map(Json).ok_or_else(|| {
        HTTPError::new(StatusCode::UNAUTHORIZED, "Failed to get user profile")
    });
    respond(&manager, outcome)
}

async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(data): Json<UpdateProfileData>,
) -> Response {
    let manager = state.session_for(&headers);
    let outcome = match manager.update_profile(&data).await {
        Some(profile) => Ok(Json(profile)),
        None => Err(failure(
            &manager,
            StatusCode::BAD_REQUEST,
            "Failed to update profile",
        )),
    };
    respond(&manager, outcome)
}

async fn list_sessions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let manager = state.session_for(&headers);
    let outcome = manager
        .list_sessions()
        .await
        .map(Json)
        .ok_or_else(|| HTTPError::new(StatusCode::UNAUTHORIZED, "Failed to list sessions"));
    respond(&manager, outcome)
}

async fn revoke_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let manager = state.session_for(&headers);
    let outcome = if manager.revoke_session(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HTTPError::new(
            StatusCode::BAD_REQUEST,
            "Failed to revoke session",
        ))
    };
    respond(&manager, outcome)
}

async fn revoke_other_sessions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let manager = state.session_for(&headers);
    let outcome = if manager.revoke_other_sessions().await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HTTPError::new(
            StatusCode::BAD_REQUEST,
            "Failed to revoke other sessions",
        ))
    };
    respond(&manager, outcome)
}

/// Sends the browser to the provider's consent page.
async fn start_oauth(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(provider): Path<String>,
) -> Result<Response, HTTPError> {
    let provider = parse_provider(&provider)?;
    let manager = state.session_for(&headers);
    let fallback = format!("Failed to start {} login", provider);
    let outcome = match manager.start_oauth_login(provider).await {
        Some(url) => Ok(Redirect::to(&url)),
        None => Err(failure(&manager, StatusCode::BAD_GATEWAY, &fallback)),
    };
    Ok(respond(&manager, outcome))
}

async fn unlink_provider(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(provider): Path<String>,
) -> Result<Response, HTTPError> {
    let provider = parse_provider(&provider)?;
    let manager = state.session_for(&headers);
    let fallback = format!("Failed to unlink {}", provider);
    let outcome = match manager.unlink_provider(provider).await {
        Some(profile) => Ok(Json(profile)),
        None => Err(failure(&manager, StatusCode::BAD_REQUEST, &fallback)),
    };
    Ok(respond(&manager, outcome))
}
