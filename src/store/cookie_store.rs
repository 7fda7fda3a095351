//! Cookie-backed token storage.
//!
//! A `CookieStore` is built from one request's `Cookie` header. Reads see
//! that request's cookies plus anything written since; writes are queued as
//! `Set-Cookie` values the HTTP layer attaches to the response.

use std::collections::HashMap;
use std::sync::Mutex;

use http::header::COOKIE;
use http::HeaderMap;
use tracing::debug;

use super::TokenStore;
use crate::config::CookieConfig;
use crate::models::TokenKind;

pub struct CookieStore {
    config: CookieConfig,
    jar: Mutex<HashMap<&'static str, String>>,
    pending: Mutex<Vec<String>>,
}

impl CookieStore {
    pub fn from_headers(config: &CookieConfig, headers: &HeaderMap) -> Self {
        let mut jar = HashMap::new();
        for value in headers.get_all(COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for pair in value.split(';') {
                let Some((name, raw)) = pair.trim().split_once('=') else {
                    continue;
                };
                let Some(kind) = TokenKind::ALL
                    .into_iter()
                    .find(|kind| kind.cookie_name() == name.trim())
                else {
                    continue;
                };
                match urlencoding::decode(raw.trim()) {
                    Ok(decoded) if !decoded.is_empty() => {
                        jar.insert(kind.cookie_name(), decoded.into_owned());
                    }
                    Ok(_) => {}
                    Err(e) => debug!("Ignoring undecodable '{}' cookie: {}", name, e),
                }
            }
        }

        CookieStore {
            config: config.clone(),
            jar: Mutex::new(jar),
            pending: Mutex::new(Vec::new()),
        }
    }

    fn max_age(&self, kind: TokenKind) -> u64 {
        match kind {
            TokenKind::Access => self.config.access_max_age,
            TokenKind::Refresh => self.config.refresh_max_age,
        }
    }

    fn set_cookie(&self, kind: TokenKind, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            kind.cookie_name(),
            urlencoding::encode(value),
            max_age
        );
        if self.config.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn queue(&self, cookie: String) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(cookie);
    }

    fn jar(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, String>> {
        self.jar.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for CookieStore {
    fn set_token(&self, kind: TokenKind, value: &str) {
        self.jar().insert(kind.cookie_name(), value.to_string());
        self.queue(self.set_cookie(kind, value, self.max_age(kind)));
    }

    fn get_token(&self, kind: TokenKind) -> Option<String> {
        self.jar().get(kind.cookie_name()).cloned()
    }

    fn remove_token(&self, kind: TokenKind) {
        self.jar().remove(kind.cookie_name());
        self.queue(self.set_cookie(kind, "", 0));
    }

    fn clear_all(&self) {
        for kind in TokenKind::ALL {
            self.remove_token(kind);
        }
    }

    fn take_set_cookies(&self) -> Vec<String> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()))
    }
}
