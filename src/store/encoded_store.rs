//! Session-scoped storage with encoded values.
//!
//! Values are Base64-encoded before they are stored and decoded on the way
//! out. This only stops a token from being read at a glance in a dump of the
//! storage; it is reversible by anyone and provides no confidentiality.

use std::collections::HashMap;
use std::sync::Mutex;

use base64::{engine::general_purpose, Engine as _};
use tracing::warn;

use super::TokenStore;
use crate::models::TokenKind;

const STORAGE_PREFIX: &str = "auth_";

#[derive(Default)]
pub struct EncodedSessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl EncodedSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage_key(kind: TokenKind) -> String {
        format!("{}{}", STORAGE_PREFIX, kind.key())
    }

    fn encode(token: &str) -> String {
        general_purpose::STANDARD.encode(token)
    }

    fn decode(stored: &str) -> String {
        match general_purpose::STANDARD
            .decode(stored)
            .map_err(|e| e.to_string())
            .and_then(|bytes| String::from_utf8(bytes).map_err(|e| e.to_string()))
        {
            Ok(token) => token,
            Err(e) => {
                warn!("Stored token could not be decoded, returning it as-is: {}", e);
                stored.to_string()
            }
        }
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> R) -> R {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut entries)
    }
}

impl TokenStore for EncodedSessionStore {
    fn set_token(&self, kind: TokenKind, value: &str) {
        let encoded = Self::encode(value);
        self.with_entries(|entries| entries.insert(Self::storage_key(kind), encoded));
    }

    fn get_token(&self, kind: TokenKind) -> Option<String> {
        self.with_entries(|entries| entries.get(&Self::storage_key(kind)).cloned())
            .map(|stored| Self::decode(&stored))
    }

    fn remove_token(&self, kind: TokenKind) {
        self.with_entries(|entries| entries.remove(&Self::storage_key(kind)));
    }

    fn clear_all(&self) {
        self.with_entries(|entries| entries.retain(|key, _| !key.starts_with(STORAGE_PREFIX)));
    }
}
