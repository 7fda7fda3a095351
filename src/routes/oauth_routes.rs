//! OAuth landing points and the error page they redirect to.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::models::OAuthProvider;
use crate::oauth::CallbackParams;
use crate::state::AppState;
use crate::utils::http_helpers::{with_store_cookies, HTTPError};

/// Registers OAuth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/callback", get(oauth_callback))
        .route("/auth/oauth/callback/:provider", get(provider_callback))
        .route("/auth/error", get(error_page))
}

/// Completes an OAuth sign-in and redirects (303) to the next page.
async fn oauth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let store = state.stores.for_request(&headers);
    let location = state.callback.handle(&params, store.as_ref()).await;
    with_store_cookies(store.as_ref(), Redirect::to(&location))
}

#[derive(Deserialize, Debug, Default)]
struct ProviderCallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

/// Passes a provider's authorization code through to the auth server and
/// stores the tokens it issues.
async fn provider_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(provider): Path<String>,
    Query(query): Query<ProviderCallbackQuery>,
) -> Result<Response, HTTPError> {
    let provider: OAuthProvider = provider
        .parse()
        .map_err(|_| HTTPError::new(StatusCode::BAD_REQUEST, "Invalid OAuth provider"))?;
    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| HTTPError::new(StatusCode::BAD_REQUEST, "No authorization code provided"))?;
    let oauth_state = query
        .state
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HTTPError::new(StatusCode::BAD_REQUEST, "No state parameter provided"))?;

    let response = state
        .api
        .forward_oauth_callback(provider, &code, &oauth_state)
        .await
        .map_err(|e| {
            error!(provider = %provider, failure = e.kind(), "OAuth callback error: {}", e);
            HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
        })?;

    let tokens = response.into_result("Authentication failed").map_err(|message| {
        warn!(provider = %provider, "Auth server rejected OAuth callback: {}", message);
        HTTPError::new(StatusCode::BAD_REQUEST, message)
    })?;

    info!(provider = %provider, "Sign-in completed through provider callback");
    let store = state.stores.for_request(&headers);
    store.store_tokens(&tokens);
    Ok(with_store_cookies(store.as_ref(), Json(tokens)))
}

#[derive(Deserialize, Debug, Default)]
struct ErrorPageQuery {
    message: Option<String>,
}

async fn error_page(Query(query): Query<ErrorPageQuery>) -> Json<serde_json::Value> {
    let message = query
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "Authentication failed".to_string());
    Json(json!({ "message": message }))
}
