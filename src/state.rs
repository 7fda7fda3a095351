//! Shared application state.
//!
//! Holds what every request handler needs: configuration, the auth server
//! client, the token store backend, the OAuth callback handler and the validation
//! log throttle.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;

use crate::api::AuthApiClient;
use crate::config::ConfigV1;
use crate::oauth::OAuthCallback;
use crate::session::SessionManager;
use crate::store::{create_store, StoreFactory};
use crate::utils::log_throttle::LogThrottle;

const VALIDATION_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Client for the external auth server.
    pub api: Arc<AuthApiClient>,
    /// Token store backend chosen at startup.
    pub stores: StoreFactory,
    pub callback: Arc<OAuthCallback>,
    /// Limits how often an unreachable auth server is reported by the
    /// identity middleware.
    pub validation_log: Arc<LogThrottle>,
}

impl AppState {
    pub fn new(config: Arc<ConfigV1>) -> Self {
        let api = Arc::new(AuthApiClient::new(config.auth_api.base_url.clone()));
        let stores = create_store(&config.store);
        let callback = Arc::new(OAuthCallback::new(
            api.clone(),
            config.auth_api.client_secret.clone(),
            config.paths.clone(),
        ));
        AppState {
            config,
            api,
            stores,
            callback,
            validation_log: Arc::new(LogThrottle::new(VALIDATION_LOG_INTERVAL)),
        }
    }

    /// A fresh session bound to the token store this request should use.
    pub fn session_for(&self, headers: &HeaderMap) -> SessionManager {
        SessionManager::new(self.api.clone(), self.stores.for_request(headers))
    }
}
