use serde::Serialize;
use tokio::sync::watch;

use crate::models::UserProfile;

/// Snapshot of the session as the presentation layer sees it.
///
/// Fields are read-only outside this module; the only way to change them is
/// through the transitions on [`AuthStore`], each of which keeps
/// `is_authenticated == user.is_some()`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    user: Option<UserProfile>,
    is_authenticated: bool,
    is_loading: bool,
    error: Option<String>,
}

impl Default for AuthState {
    fn default() -> Self {
        AuthState {
            user: None,
            is_authenticated: false,
            is_loading: true,
            error: None,
        }
    }
}

impl AuthState {
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_loading {
            SessionStatus::Loading
        } else if self.is_authenticated {
            SessionStatus::Authenticated
        } else if self.error.is_some() {
            SessionStatus::Error
        } else {
            SessionStatus::Unauthenticated
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Uninitialized,
    Loading,
    Authenticated,
    Unauthenticated,
    Error,
}

/// Owner of one `AuthState`. Observers subscribe to a watch channel and see
/// every transition.
pub struct AuthStore {
    tx: watch::Sender<AuthState>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::default());
        AuthStore { tx }
    }

    pub fn snapshot(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub fn set_user(&self, user: UserProfile) {
        self.tx.send_modify(|state| {
            state.user = Some(user);
            state.is_authenticated = true;
            state.is_loading = false;
            state.error = None;
        });
    }

    /// Drops the user. Any error message is left in place.
    pub fn clear_user(&self) {
        self.tx.send_modify(|state| {
            state.user = None;
            state.is_authenticated = false;
            state.is_loading = false;
        });
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.tx.send_modify(|state| state.is_loading = is_loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.tx.send_modify(|state| {
            state.error = error;
            state.is_loading = false;
        });
    }

    pub fn reset(&self) {
        self.tx.send_replace(AuthState::default());
    }
}
