#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use sessiongate::config::{extract_config, ConfigV1};
use sessiongate::routes::create_router;
use sessiongate::state::AppState;

pub const CLIENT_SECRET: &str = "test-client-secret";

/// Test configuration pointing the auth client at `auth_api_url`, usually a
/// mockito server. `store` is the YAML body of the `store` section.
pub fn load_test_config(auth_api_url: &str, store: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
bind_address: 127.0.0.1:8081
auth_api:
  base_url: {auth_api_url}
  client_secret: {CLIENT_SECRET}
store:
{store}
logging:
  level: debug
  format: json
"#
    );
    extract_config(&Figment::new().merge(Yaml::string(&yaml)))
        .expect("Failed to parse test config YAML")
}

pub const COOKIE_STORE: &str = "  type: cookie\n  secure: false";
pub const MEMORY_STORE: &str = "  type: memory";

pub fn build_app(config: ConfigV1) -> (Router, Arc<ConfigV1>) {
    let config = Arc::new(config);
    let state = AppState::new(config.clone());
    (create_router(state), config)
}

pub fn request(method: Method, path: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookies) = cookies {
        builder = builder.header(COOKIE, cookies);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

pub fn json_request(method: Method, path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| value.to_str().expect("Set-Cookie not valid UTF-8").to_string())
        .collect()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get("location")
        .expect("Location header missing")
        .to_str()
        .expect("Location header not valid UTF-8")
        .to_string()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
