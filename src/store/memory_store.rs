use std::collections::HashMap;
use std::sync::Mutex;

use super::TokenStore;
use crate::models::TokenKind;

/// Plain key/value storage, values kept verbatim.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<&'static str, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut HashMap<&'static str, String>) -> R) -> R {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut entries)
    }
}

impl TokenStore for MemoryStore {
    fn set_token(&self, kind: TokenKind, value: &str) {
        self.with_entries(|entries| entries.insert(kind.key(), value.to_string()));
    }

    fn get_token(&self, kind: TokenKind) -> Option<String> {
        self.with_entries(|entries| entries.get(kind.key()).cloned())
    }

    fn remove_token(&self, kind: TokenKind) {
        self.with_entries(|entries| entries.remove(kind.key()));
    }

    fn clear_all(&self) {
        self.with_entries(|entries| entries.clear());
    }
}
