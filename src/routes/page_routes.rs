//! Server-rendered page loads. Each handler returns the data its page
//! renders, or a guard redirect.

use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::models::RequestIdentity;
use crate::session::{protected_load, public_only_load, AuthState};
use crate::state::AppState;
use crate::utils::http_helpers::with_store_cookies;

/// Registers page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(layout))
        .route("/protected", get(protected_page))
        .route("/onboarding", get(protected_page))
        .route("/login", get(public_only_page))
        .route("/register", get(public_only_page))
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PageData {
    identity: RequestIdentity,
    session: AuthState,
}

/// Layout load: the session is seeded from the request identity without a
/// round trip of its own.
async fn layout(
    State(state): State<AppState>,
    headers: HeaderMap,
    identity: RequestIdentity,
) -> Response {
    let manager = state.session_for(&headers);
    manager.hydrate(&identity);
    let data = PageData {
        identity,
        session: manager.state(),
    };
    with_store_cookies(manager.store().as_ref(), Json(data))
}

async fn protected_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    identity: RequestIdentity,
) -> Response {
    let manager = state.session_for(&headers);
    let outcome = protected_load(&manager, &uri, &state.config.paths.login)
        .await
        .map(|session| Json(PageData { identity, session }));
    with_store_cookies(manager.store().as_ref(), outcome)
}

async fn public_only_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    identity: RequestIdentity,
) -> Response {
    let manager = state.session_for(&headers);
    let outcome = public_only_load(&manager, &state.config.paths.home)
        .await
        .map(|session| Json(PageData { identity, session }));
    with_store_cookies(manager.store().as_ref(), outcome)
}
