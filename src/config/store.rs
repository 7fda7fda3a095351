use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which token store backend to bind at startup. Differentiated via a
/// "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// Per-request cookies; the backend to use for multi-user deployments.
    #[serde(rename = "cookie")]
    Cookie(CookieConfig),
    /// Process-wide map with Base64-encoded values. Single-tenant only.
    #[serde(rename = "session")]
    Session,
    /// Process-wide map with plain values. Single-tenant only.
    #[serde(rename = "memory")]
    Memory,
    /// No backend: reads return nothing and writes are dropped.
    #[serde(rename = "disabled")]
    Disabled,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Cookie(CookieConfig::default())
    }
}

/// Attributes applied to the `auth_token` and `refresh_token` cookies.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct CookieConfig {
    #[serde(default = "default_secure")]
    pub secure: bool,
    #[serde(default = "default_access_max_age")]
    pub access_max_age: u64,
    #[serde(default = "default_refresh_max_age")]
    pub refresh_max_age: u64,
}

fn default_secure() -> bool {
    true
}

fn default_access_max_age() -> u64 {
    60 * 60 * 24
}

fn default_refresh_max_age() -> u64 {
    60 * 60 * 24 * 30
}

impl Default for CookieConfig {
    fn default() -> Self {
        CookieConfig {
            secure: default_secure(),
            access_max_age: default_access_max_age(),
            refresh_max_age: default_refresh_max_age(),
        }
    }
}
