use std::collections::HashMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Payload type for endpoints whose `data` carries nothing of interest.
pub type Empty = IgnoredAny;

/// Uniform envelope returned by every auth server endpoint.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
    /// HTTP status the envelope arrived with, recorded by the client.
    #[serde(skip)]
    pub http_status: Option<u16>,
}

impl<T> ApiResponse<T> {
    /// Returns the payload of a successful response, or the server's error
    /// message (falling back to `fallback`) otherwise.
    pub fn into_result(self, fallback: &str) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.error.unwrap_or_else(|| fallback.to_string())),
        }
    }

    /// False only when the envelope is known to have come with a non-2xx
    /// status.
    pub fn is_ok_status(&self) -> bool {
        self.http_status
            .map_or(true, |status| (200..300).contains(&status))
    }

    /// Success flag for endpoints that return no payload.
    pub fn into_ack(self, fallback: &str) -> Result<(), String> {
        if self.success {
            Ok(())
        } else {
            Err(self.error.unwrap_or_else(|| fallback.to_string()))
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCredentials {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
}

/// One login session known to the auth server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub id: String,
    pub created_at: String,
    pub last_activity: String,
    pub expires_at: String,
    pub device: String,
    pub browser: String,
    pub os: String,
    pub ip_address: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OAuthUrl {
    pub url: String,
}

/// Result of `GET /auth/validate`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TokenValidation {
    pub valid: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "name")]
    pub full_name: Option<String>,
    #[serde(default, alias = "verified")]
    pub is_verified: Option<bool>,
}

/// Result of `POST /auth/exchange-token`: the signed envelope.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenExchangeData {
    #[serde(default)]
    pub token_hash: Option<String>,
}
