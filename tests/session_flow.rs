mod common;

use axum::http::{Method, StatusCode};
use common::*;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tower::ServiceExt;

const PROFILE: &str = r#"{"success": true, "data": {"userId": "u1", "email": "ada@example.com", "fullName": "Ada", "isVerified": true, "providers": ["github"]}}"#;

async fn mock_profile(server: &mut ServerGuard, token: &str, status: usize, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/auth/profile")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

async fn mock_validate(server: &mut ServerGuard, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/auth/validate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn integration_health_needs_no_auth_server() {
    let (app, _config) = build_app(load_test_config("http://127.0.0.1:1", COOKIE_STORE));

    let response = app
        .oneshot(request(Method::GET, "/health", None))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn integration_protected_page_redirects_anonymous() {
    let mut server = Server::new_async().await;
    let validate = server
        .mock("GET", "/auth/validate")
        .expect(0)
        .create_async()
        .await;
    let (app, _config) = build_app(load_test_config(&server.url(), COOKIE_STORE));

    let response = app
        .oneshot(request(Method::GET, "/protected?tab=1", None))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirect=%2Fprotected%3Ftab%3D1");
    validate.assert_async().await;
}

#[tokio::test]
async fn integration_login_sets_cookies() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .match_body(Matcher::Json(json!({ "email": "ada@example.com", "password": "pw" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"accessToken": "a1", "refreshToken": "r1", "expiresIn": 900}}"#)
        .create_async()
        .await;
    mock_profile(&mut server, "a1", 200, PROFILE).await;
    let (app, _config) = build_app(load_test_config(&server.url(), COOKIE_STORE));

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/session/login",
            json!({ "email": "ada@example.com", "password": "pw" }),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c == "auth_token=a1; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"));
    assert!(cookies
        .iter()
        .any(|c| c == "refresh_token=r1; Path=/; HttpOnly; SameSite=Lax; Max-Age=2592000"));

    let body = json_body(response).await;
    assert_eq!(body["userId"], "u1");
}

#[tokio::test]
async fn integration_login_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "error": "Invalid credentials"}"#)
        .create_async()
        .await;
    let (app, _config) = build_app(load_test_config(&server.url(), COOKIE_STORE));

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/session/login",
            json!({ "email": "ada@example.com", "password": "wrong" }),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(json_body(response).await["error"], "Invalid credentials");
}

#[tokio::test]
async fn integration_expired_session_is_refreshed_once() {
    let mut server = Server::new_async().await;
    mock_validate(&mut server, r#"{"success": true, "data": {"valid": false}}"#).await;
    mock_profile(&mut server, "stale", 401, r#"{"success": false, "error": "Token expired"}"#).await;
    let refresh = server
        .mock("POST", "/auth/refresh-token")
        .match_body(Matcher::Json(json!({ "refreshToken": "r1" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"accessToken": "fresh", "expiresIn": 900}}"#)
        .expect(1)
        .create_async()
        .await;
    mock_profile(&mut server, "fresh", 200, PROFILE).await;
    let (app, _config) = build_app(load_test_config(&server.url(), COOKIE_STORE));

    let response = app
        .oneshot(request(
            Method::GET,
            "/protected",
            Some("auth_token=stale; refresh_token=r1"),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    refresh.assert_async().await;
    assert!(set_cookies(&response)
        .iter()
        .any(|c| c.starts_with("auth_token=fresh;")));

    let body = json_body(response).await;
    assert_eq!(body["session"]["isAuthenticated"], true);
    assert_eq!(body["session"]["user"]["userId"], "u1");
    assert_eq!(body["identity"]["isAuthenticated"], false);
}

#[tokio::test]
async fn integration_failed_refresh_clears_cookies() {
    let mut server = Server::new_async().await;
    mock_validate(&mut server, r#"{"success": true, "data": {"valid": false}}"#).await;
    mock_profile(&mut server, "stale", 401, r#"{"success": false}"#).await;
    server
        .mock("POST", "/auth/refresh-token")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": false, "error": "Refresh token revoked"}"#)
        .expect(1)
        .create_async()
        .await;
    let (app, _config) = build_app(load_test_config(&server.url(), COOKIE_STORE));

    let response = app
        .oneshot(request(
            Method::GET,
            "/session/state",
            Some("auth_token=stale; refresh_token=r1"),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("auth_token=;") && c.contains("Max-Age=0")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("refresh_token=;") && c.contains("Max-Age=0")));
    assert_eq!(json_body(response).await["status"], "unauthenticated");
}

#[tokio::test]
async fn integration_logout_succeeds_with_unreachable_server() {
    let (app, _config) = build_app(load_test_config("http://127.0.0.1:1", COOKIE_STORE));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/session/logout",
                Some("auth_token=a1; refresh_token=r1"),
            ))
            .await
            .expect("request should complete");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response).iter().all(|c| c.contains("Max-Age=0")));
        assert_eq!(json_body(response).await["success"], true);
    }
}

#[tokio::test]
async fn integration_login_page_redirects_signed_in_user() {
    let mut server = Server::new_async().await;
    mock_validate(
        &mut server,
        r#"{"success": true, "data": {"valid": true, "userId": "u1", "email": "ada@example.com", "fullName": "Ada", "isVerified": true}}"#,
    )
    .await;
    mock_profile(&mut server, "a1", 200, PROFILE).await;
    let (app, _config) = build_app(load_test_config(&server.url(), COOKIE_STORE));

    let response = app
        .oneshot(request(Method::GET, "/login", Some("auth_token=a1")))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn integration_layout_uses_bearer_identity() {
    let mut server = Server::new_async().await;
    let validate = server
        .mock("GET", "/auth/validate")
        .match_header("authorization", "Bearer header-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"valid": true, "userId": "u1", "email": "ada@example.com", "fullName": "Ada", "isVerified": true}}"#)
        .expect(1)
        .create_async()
        .await;
    let (app, _config) = build_app(load_test_config(&server.url(), COOKIE_STORE));

    let mut req = request(Method::GET, "/", None);
    req.headers_mut()
        .insert("authorization", "Bearer header-token".parse().unwrap());
    let response = app.oneshot(req).await.expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    validate.assert_async().await;
    let body = json_body(response).await;
    assert_eq!(body["identity"]["isAuthenticated"], true);
    assert_eq!(body["identity"]["user"]["fullName"], "Ada");
    assert_eq!(body["session"]["isAuthenticated"], true);
    assert_eq!(body["session"]["isLoading"], false);
}

#[tokio::test]
async fn integration_memory_store_keeps_session_between_requests() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"accessToken": "a1", "expiresIn": 900}}"#)
        .create_async()
        .await;
    mock_profile(&mut server, "a1", 200, PROFILE).await;
    mock_validate(&mut server, r#"{"success": true, "data": {"valid": true, "userId": "u1"}}"#).await;
    let (app, _config) = build_app(load_test_config(&server.url(), MEMORY_STORE));

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/session/login",
            json!({ "email": "ada@example.com", "password": "pw" }),
        ))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());

    let response = app
        .oneshot(request(Method::GET, "/session/profile", None))
        .await
        .expect("request should complete");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["email"], "ada@example.com");
}

#[tokio::test]
async fn integration_unknown_provider_is_rejected() {
    let (app, _config) = build_app(load_test_config("http://127.0.0.1:1", COOKIE_STORE));

    let response = app
        .oneshot(request(Method::GET, "/session/oauth/myspace", None))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid OAuth provider");
}

#[tokio::test]
async fn integration_unlink_fails_when_profile_cannot_be_reloaded() {
    let mut server = Server::new_async().await;
    mock_validate(&mut server, r#"{"success": true, "data": {"valid": true, "userId": "u1"}}"#).await;
    let unlink = server
        .mock("DELETE", "/auth/oauth/unlink/github")
        .match_header("authorization", "Bearer a1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true}"#)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/auth/profile")
        .with_status(503)
        .with_body("unavailable")
        .create_async()
        .await;
    let (app, _config) = build_app(load_test_config(&server.url(), COOKIE_STORE));

    let response = app
        .oneshot(request(
            Method::DELETE,
            "/session/oauth/unlink/github",
            Some("auth_token=a1"),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Failed to get user profile");
    unlink.assert_async().await;
}
