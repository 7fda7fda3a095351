use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::store::StoreConfig;

const CONFIG_PATH_ENV: &str = "SESSIONGATE_CONFIG";
const ENV_PREFIX: &str = "SESSIONGATE_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    pub auth_api: AuthApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the external auth server lives and the secret shared with it for
/// the OAuth token exchange.
#[derive(Deserialize, Serialize, Clone, JsonSchema)]
pub struct AuthApiConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
}

impl std::fmt::Debug for AuthApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthApiConfig")
            .field("base_url", &self.base_url)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Front-end paths used as redirect targets.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct PathsConfig {
    pub error: String,
    pub onboarding: String,
    pub landing: String,
    pub login: String,
    pub home: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            error: "/auth/error".to_string(),
            onboarding: "/onboarding".to_string(),
            landing: "/protected".to_string(),
            login: "/login".to_string(),
            home: "/".to_string(),
        }
    }
}

/// Builds the figment used to load configuration: the YAML file, then any
/// `SESSIONGATE_*` environment overrides (nested keys split on `__`).
pub fn figment(path: &str) -> Figment {
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config"]))
}

/// Extracts a versioned config from any figment.
pub fn extract_config(figment: &Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from `$SESSIONGATE_CONFIG`, defaulting to "./config.yaml".
pub fn load_config() -> ConfigV1 {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.yaml".to_string());
    match extract_config(&figment(&path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration from '{}': {}", path, e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
