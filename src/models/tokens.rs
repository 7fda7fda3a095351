use serde::{Deserialize, Serialize};

/// Token bundle issued by login, register, refresh and the OAuth exchange.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(rename = "expiresIn", default)]
    pub expires_in_seconds: u64,
}

/// The two token kinds a `TokenStore` tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub const ALL: [TokenKind; 2] = [TokenKind::Access, TokenKind::Refresh];

    /// Fixed storage key used by key/value backends.
    pub fn key(&self) -> &'static str {
        match self {
            TokenKind::Access => "accessToken",
            TokenKind::Refresh => "refreshToken",
        }
    }

    /// Cookie name used by the cookie backend.
    pub fn cookie_name(&self) -> &'static str {
        match self {
            TokenKind::Access => "auth_token",
            TokenKind::Refresh => "refresh_token",
        }
    }
}

/// Whatever a store currently holds; either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Decoded body of the signed OAuth token-exchange envelope.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenExchangePayload {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub is_new_user: bool,
}

impl From<&TokenExchangePayload> for AuthTokens {
    fn from(payload: &TokenExchangePayload) -> Self {
        AuthTokens {
            access_token: payload.access_token.clone(),
            refresh_token: payload.refresh_token.clone(),
            expires_in_seconds: 0,
        }
    }
}
