use std::sync::Arc;

use http::HeaderMap;
use tracing::{debug, info, warn};

use super::{
    cookie_store::CookieStore, encoded_store::EncodedSessionStore, memory_store::MemoryStore,
    no_store::NoStore,
};
use crate::config::{CookieConfig, StoreConfig};
use crate::models::{AuthTokens, StoredTokens, TokenKind};

/// The TokenStore trait abstracts where access and refresh tokens live.
///
/// Implementations must never panic or surface an error: a backend that
/// cannot persist anything behaves like `NoStore`.
pub trait TokenStore: Send + Sync {
    fn set_token(&self, kind: TokenKind, value: &str);
    fn get_token(&self, kind: TokenKind) -> Option<String>;
    fn remove_token(&self, kind: TokenKind);
    fn clear_all(&self);

    fn is_enabled(&self) -> bool {
        true
    }

    /// `Set-Cookie` values produced since the last call. Only the cookie
    /// backend has any.
    fn take_set_cookies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Persists a token bundle. The refresh token is only written when the
    /// bundle carries one, so a refresh that doesn't rotate keeps the old one.
    fn store_tokens(&self, tokens: &AuthTokens) {
        self.set_token(TokenKind::Access, &tokens.access_token);
        if let Some(refresh_token) = &tokens.refresh_token {
            self.set_token(TokenKind::Refresh, refresh_token);
        }
    }

    fn get_tokens(&self) -> StoredTokens {
        StoredTokens {
            access_token: self.get_token(TokenKind::Access),
            refresh_token: self.get_token(TokenKind::Refresh),
        }
    }

    fn clear_tokens(&self) {
        for kind in TokenKind::ALL {
            self.remove_token(kind);
        }
    }
}

/// The backend chosen at startup. Cookie stores are built per request from
/// the inbound headers; the other backends are shared by every request.
#[derive(Clone)]
pub enum StoreFactory {
    Cookie(CookieConfig),
    Shared(Arc<dyn TokenStore>),
}

impl StoreFactory {
    /// Returns the store a request should read from and write to.
    pub fn for_request(&self, headers: &HeaderMap) -> Arc<dyn TokenStore> {
        match self {
            StoreFactory::Cookie(config) => Arc::new(CookieStore::from_headers(config, headers)),
            StoreFactory::Shared(store) => store.clone(),
        }
    }

    /// True when one client's tokens are visible to every other client.
    pub fn shares_tokens_between_clients(&self) -> bool {
        match self {
            StoreFactory::Cookie(_) => false,
            StoreFactory::Shared(store) => store.is_enabled(),
        }
    }
}

/// Creates the store factory for the configured backend.
pub fn create_store(config: &StoreConfig) -> StoreFactory {
    let (name, factory) = match config {
        StoreConfig::Cookie(cookie_config) => {
            info!(
                "Using cookie token store (secure={}).",
                cookie_config.secure
            );
            ("cookie", StoreFactory::Cookie(cookie_config.clone()))
        }
        StoreConfig::Session => (
            "session",
            StoreFactory::Shared(Arc::new(EncodedSessionStore::new())),
        ),
        StoreConfig::Memory => ("memory", StoreFactory::Shared(Arc::new(MemoryStore::new()))),
        StoreConfig::Disabled => {
            debug!("Token store is disabled. Using NoStore.");
            ("disabled", StoreFactory::Shared(Arc::new(NoStore::new())))
        }
    };

    if factory.shares_tokens_between_clients() {
        warn!(
            "Using the '{}' token store: every client of this process shares one session. \
             Use the cookie store for multi-user deployments.",
            name
        );
    }
    factory
}
