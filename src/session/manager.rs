//! The session orchestrator.
//!
//! A `SessionManager` ties one token store to one `AuthStore` and drives the
//! session through `Uninitialized -> Loading -> {Authenticated,
//! Unauthenticated, Error}`. Remote failures never escape: every operation
//! resolves to a state transition plus an `Option`/`bool` result, and the
//! loading flag is always cleared before an operation returns.
//!
//! Expired sessions get exactly one refresh attempt per initialization, so a
//! dead refresh token costs a bounded number of round trips.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::state::{AuthState, AuthStore, SessionStatus};
use crate::api::{ApiError, AuthApiClient};
use crate::models::{
    ActiveSession, ApiResponse, AuthTokens, LoginCredentials, OAuthProvider,
    RegisterCredentials, RequestIdentity, TokenKind, UpdateProfileData, UserProfile,
};
use crate::store::TokenStore;

const PROFILE_FAILED: &str = "Failed to get user profile";
const NO_SESSION: &str = "Not signed in";

/// Outcome of reconciling stored tokens with the auth server.
enum Reconciled {
    Authenticated(UserProfile),
    /// Nothing stored; nothing to clean up.
    NoSession,
    /// Tokens were stored but could not be turned into a profile.
    Rejected,
}

pub struct SessionManager {
    api: Arc<AuthApiClient>,
    store: Arc<dyn TokenStore>,
    state: AuthStore,
    initialized: AtomicBool,
}

impl SessionManager {
    pub fn new(api: Arc<AuthApiClient>, store: Arc<dyn TokenStore>) -> Self {
        SessionManager {
            api,
            store,
            state: AuthStore::new(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn state(&self) -> AuthState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        if self.initialized.load(Ordering::SeqCst) {
            self.state.snapshot().status()
        } else {
            SessionStatus::Uninitialized
        }
    }

    /// Reconciles the stored tokens with a validated identity.
    pub async fn initialize(&self) -> SessionStatus {
        self.initialized.store(true, Ordering::SeqCst);
        self.state.set_loading(true);

        match self.reconcile().await {
            Ok(Reconciled::Authenticated(profile)) => {
                info!(user_id = %profile.user_id, "Session initialized");
                self.state.set_user(profile);
            }
            Ok(Reconciled::NoSession) => {
                debug!("No stored access token; session is anonymous");
                self.state.clear_user();
            }
            Ok(Reconciled::Rejected) => {
                info!("Stored session could not be restored; clearing tokens");
                self.state.clear_user();
                self.store.clear_tokens();
            }
            Err(e) => {
                error!(failure = e.kind(), "Auth initialization error: {}", e);
                self.store.clear_tokens();
                self.state.clear_user();
                self.state.set_error(Some(e.to_string()));
            }
        }

        self.state.set_loading(false);
        self.status()
    }

    async fn reconcile(&self) -> Result<Reconciled, ApiError> {
        let tokens = self.store.get_tokens();
        let Some(access_token) = tokens.access_token else {
            return Ok(Reconciled::NoSession);
        };

        let current = self.api.get_profile(&access_token).await?;
        if let Ok(profile) = current.into_result(PROFILE_FAILED) {
            return Ok(Reconciled::Authenticated(profile));
        }

        let Some(refresh_token) = tokens.refresh_token else {
            debug!("Access token rejected and no refresh token stored");
            return Ok(Reconciled::Rejected);
        };

        Ok(match self.refresh_chain(&refresh_token).await? {
            Some(profile) => Reconciled::Authenticated(profile),
            None => Reconciled::Rejected,
        })
    }

    /// One refresh, then one profile fetch with the new access token.
    /// `Ok(None)` means the server turned down either step.
    async fn refresh_chain(&self, refresh_token: &str) -> Result<Option<UserProfile>, ApiError> {
        let tokens = match self
            .api
            .refresh_token(refresh_token)
            .await?
            .into_result("Failed to refresh session")
        {
            Ok(tokens) => tokens,
            Err(e) => {
                debug!("Refresh rejected: {}", e);
                return Ok(None);
            }
        };
        self.store.store_tokens(&tokens);

        match self
            .api
            .get_profile(&tokens.access_token)
            .await?
            .into_result(PROFILE_FAILED)
        {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                debug!("Profile fetch with refreshed token rejected: {}", e);
                Ok(None)
            }
        }
    }

    /// Persists freshly issued tokens and loads the profile they belong to.
    /// Tokens are dropped again if the profile can't be loaded, so a failed
    /// sign-in never leaves a half-established session behind.
    async fn establish(
        &self,
        issued: Result<ApiResponse<AuthTokens>, ApiError>,
        fallback: &str,
    ) -> Result<UserProfile, String> {
        let tokens = issued.map_err(|e| e.to_string())?.into_result(fallback)?;
        self.store.store_tokens(&tokens);

        let profile = match self.api.get_profile(&tokens.access_token).await {
            Ok(response) => response.into_result(PROFILE_FAILED),
            Err(e) => Err(e.to_string()),
        };
        if profile.is_err() {
            self.store.clear_tokens();
        }
        profile
    }

    /// Applies the result of a loading operation to the state.
    fn finish(&self, operation: &str, outcome: Result<UserProfile, String>) -> Option<UserProfile> {
        let profile = match outcome {
            Ok(profile) => {
                self.state.set_user(profile.clone());
                Some(profile)
            }
            Err(message) => {
                warn!("{} error: {}", operation, message);
                self.state.set_error(Some(message));
                None
            }
        };
        self.state.set_loading(false);
        profile
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Option<UserProfile> {
        self.state.set_loading(true);
        let issued = self.api.login(credentials).await;
        let outcome = self.establish(issued, "Login failed").await;
        self.finish("Login", outcome)
    }

    pub async fn register(&self, credentials: &RegisterCredentials) -> Option<UserProfile> {
        self.state.set_loading(true);
        let issued = self.api.register(credentials).await;
        let outcome = self.establish(issued, "Registration failed").await;
        self.finish("Registration", outcome)
    }

    /// Signs out locally no matter what the server says.
    pub async fn logout(&self) -> bool {
        self.state.set_loading(true);

        let access_token = self.store.get_token(TokenKind::Access);
        match self.api.logout(access_token.as_deref()).await {
            Ok(response) if response.success => debug!("Server acknowledged logout"),
            Ok(response) => warn!(
                "Server rejected logout: {}",
                response.error.unwrap_or_default()
            ),
            Err(e) => warn!("Logout error: {}", e),
        }

        self.state.clear_user();
        self.store.clear_tokens();
        self.state.set_loading(false);
        true
    }

    pub async fn update_profile(&self, data: &UpdateProfileData) -> Option<UserProfile> {
        self.state.set_loading(true);
        let outcome = match self.access_token() {
            Some(token) => match self.api.update_profile(data, &token).await {
                Ok(response) => response.into_result("Failed to update profile"),
                Err(e) => Err(e.to_string()),
            },
            None => Err(NO_SESSION.to_string()),
        };
        self.finish("Update profile", outcome)
    }

    /// Raises the loading flag around `operation` and always lowers it again.
    async fn settle<T>(&self, operation: impl Future<Output = T>) -> T {
        self.state.set_loading(true);
        let result = operation.await;
        self.state.set_loading(false);
        result
    }

    /// Runs the refresh chain on demand. Returns true only when a new token
    /// was issued and its profile loaded.
    pub async fn refresh_session(&self) -> bool {
        self.settle(self.refresh_stored()).await
    }

    async fn refresh_stored(&self) -> bool {
        let Some(refresh_token) = self.store.get_token(TokenKind::Refresh) else {
            return false;
        };

        match self.refresh_chain(&refresh_token).await {
            Ok(Some(profile)) => {
                self.state.set_user(profile);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Session refresh error: {}", e);
                false
            }
        }
    }

    pub async fn get_profile(&self) -> Option<UserProfile> {
        self.settle(self.fetch_profile()).await
    }

    async fn fetch_profile(&self) -> Option<UserProfile> {
        let token = self.access_token()?;
        match self.api.get_profile(&token).await {
            Ok(response) => match response.into_result(PROFILE_FAILED) {
                Ok(profile) => {
                    self.state.set_user(profile.clone());
                    Some(profile)
                }
                Err(e) => {
                    debug!("Profile fetch rejected: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Get profile error: {}", e);
                None
            }
        }
    }

    /// Asks the auth server where to send the browser for `provider`.
    pub async fn start_oauth_login(&self, provider: OAuthProvider) -> Option<String> {
        self.settle(async {
            let fallback = format!("Failed to start {} login", provider);
            let outcome = match self.api.get_oauth_url(provider).await {
                Ok(response) => response.into_result(&fallback).map(|data| data.url),
                Err(e) => Err(e.to_string()),
            };
            match outcome {
                Ok(url) => Some(url),
                Err(message) => {
                    warn!("{} OAuth error: {}", provider, message);
                    self.state.set_error(Some(message));
                    None
                }
            }
        })
        .await
    }

    pub async fn list_sessions(&self) -> Option<Vec<ActiveSession>> {
        self.settle(async {
            let token = self.access_token()?;
            match self.api.get_sessions(&token).await {
                Ok(response) => response
                    .into_result("Failed to list sessions")
                    .map_err(|e| debug!("Session listing rejected: {}", e))
                    .ok(),
                Err(e) => {
                    warn!("List sessions error: {}", e);
                    None
                }
            }
        })
        .await
    }

    pub async fn revoke_session(&self, session_id: &str) -> bool {
        self.settle(async {
            let Some(token) = self.access_token() else {
                return false;
            };
            let result = self.api.revoke_session(session_id, &token).await;
            Self::acknowledged("Revoke session", result)
        })
        .await
    }

    pub async fn revoke_other_sessions(&self) -> bool {
        self.settle(async {
            let Some(token) = self.access_token() else {
                return false;
            };
            let result = self.api.revoke_other_sessions(&token).await;
            Self::acknowledged("Revoke other sessions", result)
        })
        .await
    }

    /// Unlinks an OAuth provider and reloads the profile so the linked
    /// provider set stays current. Returns the reloaded profile; `None` if
    /// either the unlink or the reload failed.
    pub async fn unlink_provider(&self, provider: OAuthProvider) -> Option<UserProfile> {
        self.settle(async {
            let token = self.access_token()?;
            let result = self.api.unlink_provider(provider, &token).await;
            if !Self::acknowledged("Unlink provider", result) {
                return None;
            }
            let profile = self.fetch_profile().await;
            if profile.is_none() {
                self.state.set_error(Some(PROFILE_FAILED.to_string()));
            }
            profile
        })
        .await
    }

    /// Seeds the state from the identity the request middleware resolved,
    /// without any round trip of its own.
    pub fn hydrate(&self, identity: &RequestIdentity) {
        self.initialized.store(true, Ordering::SeqCst);
        match (identity.is_authenticated, &identity.user) {
            (true, Some(user)) => self.state.set_user(UserProfile::from(user)),
            _ => self.state.clear_user(),
        }
        self.state.set_loading(false);
    }

    fn access_token(&self) -> Option<String> {
        self.store.get_token(TokenKind::Access)
    }

    fn acknowledged<T>(operation: &str, result: Result<ApiResponse<T>, ApiError>) -> bool {
        match result.map_err(|e| e.to_string()).and_then(|r| r.into_ack(operation)) {
            Ok(()) => true,
            Err(e) => {
                warn!("{} failed: {}", operation, e);
                false
            }
        }
    }
}
