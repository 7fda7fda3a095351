//! Page guards. Both guards let a request through while the session is still
//! loading; callers that need a settled answer use the `*_load` variants,
//! which initialize the session first.

use axum::http::Uri;
use axum::response::{IntoResponse, Redirect, Response};

use super::manager::SessionManager;
use super::state::AuthState;

/// A guard decision to send the browser elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRedirect {
    pub location: String,
}

impl IntoResponse for GuardRedirect {
    fn into_response(self) -> Response {
        Redirect::temporary(&self.location).into_response()
    }
}

/// Only authenticated sessions may pass. Everyone else is sent to the login
/// page with the requested path and query preserved in `redirect`.
pub fn protected_guard(state: &AuthState, uri: &Uri, login_path: &str) -> Result<(), GuardRedirect> {
    if state.is_loading() || state.is_authenticated() {
        return Ok(());
    }

    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    Err(GuardRedirect {
        location: format!("{}?redirect={}", login_path, urlencoding::encode(target)),
    })
}

/// Only anonymous sessions may pass; signed-in users go home.
pub fn public_only_guard(state: &AuthState, home_path: &str) -> Result<(), GuardRedirect> {
    if !state.is_loading() && state.is_authenticated() {
        return Err(GuardRedirect {
            location: home_path.to_string(),
        });
    }
    Ok(())
}

pub async fn protected_load(
    manager: &SessionManager,
    uri: &Uri,
    login_path: &str,
) -> Result<AuthState, GuardRedirect> {
    manager.initialize().await;
    let state = manager.state();
    protected_guard(&state, uri, login_path)?;
    Ok(state)
}

pub async fn public_only_load(
    manager: &SessionManager,
    home_path: &str,
) -> Result<AuthState, GuardRedirect> {
    manager.initialize().await;
    let state = manager.state();
    public_only_guard(&state, home_path)?;
    Ok(state)
}
