//! HTTP route definitions and handlers.
//!
//! Pages and session routes sit behind the identity middleware, so every
//! request they see carries a `RequestIdentity`. The health check does not.

mod health_routes;
mod oauth_routes;
mod page_routes;
mod session_routes;

use crate::session::resolve_identity;
use crate::state::AppState;
use axum::{middleware, Router};

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(page_routes::routes())
        .merge(session_routes::routes())
        .merge(oauth_routes::routes())
        .layer(middleware::from_fn_with_state(state.clone(), resolve_identity))
        .merge(health_routes::routes())
        .with_state(state)
}
