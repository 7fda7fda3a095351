use super::TokenStore;
use crate::models::TokenKind;

/// A store with no backend behind it. Writes are dropped and reads find
/// nothing, so callers can run unchanged where no storage exists.
pub struct NoStore;

impl NoStore {
    pub fn new() -> Self {
        NoStore
    }
}

impl Default for NoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for NoStore {
    fn set_token(&self, _kind: TokenKind, _value: &str) {}

    fn get_token(&self, _kind: TokenKind) -> Option<String> {
        None
    }

    fn remove_token(&self, _kind: TokenKind) {}

    fn clear_all(&self) {}

    fn is_enabled(&self) -> bool {
        false
    }
}
