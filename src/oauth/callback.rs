use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::signature::verify_signed_payload;
use crate::api::AuthApiClient;
use crate::config::PathsConfig;
use crate::models::{AuthTokens, TokenExchangePayload, TokenKind};
use crate::store::TokenStore;

/// Query string of the auth server's redirect back to `/auth/callback`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CallbackParams {
    pub success: Option<String>,
    pub key: Option<String>,
    pub error_message: Option<String>,
}

/// Every way an OAuth callback can fail. The display text is what the user
/// sees on the error page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackError {
    #[error("No success parameter provided")]
    MissingSuccess,
    #[error("No key parameter provided")]
    MissingKey,
    #[error("{0}")]
    Denied(String),
    #[error("{0}")]
    ExchangeFailed(String),
    #[error("Invalid token response")]
    MalformedResponse,
    #[error("Invalid signature")]
    InvalidSignature,
}

/// Turns a one-time exchange key into a stored session.
pub struct OAuthCallback {
    api: Arc<AuthApiClient>,
    client_secret: String,
    paths: PathsConfig,
}

impl OAuthCallback {
    pub fn new(api: Arc<AuthApiClient>, client_secret: impl Into<String>, paths: PathsConfig) -> Self {
        OAuthCallback {
            api,
            client_secret: client_secret.into(),
            paths,
        }
    }

    /// Runs the callback procedure against `store`. Nothing is written to the
    /// store until the envelope signature has been verified.
    pub async fn complete(
        &self,
        params: &CallbackParams,
        store: &dyn TokenStore,
    ) -> Result<TokenExchangePayload, CallbackError> {
        store.remove_token(TokenKind::Access);

        let success = params
            .success
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(CallbackError::MissingSuccess)?;
        let key = params
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(CallbackError::MissingKey)?;

        if success == "false" {
            let message = params
                .error_message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Authentication failed".to_string());
            return Err(CallbackError::Denied(message));
        }

        let exchanged = match self.api.exchange_token(key, &self.client_secret).await {
            Ok(response) if !response.is_ok_status() => {
                let message = response
                    .error
                    .unwrap_or_else(|| "Failed to exchange token".to_string());
                return Err(CallbackError::ExchangeFailed(message));
            }
            Ok(response) => response
                .into_result("Invalid token response")
                .map_err(|_| CallbackError::MalformedResponse)?,
            Err(e) => {
                warn!("Token exchange request failed: {}", e);
                return Err(CallbackError::ExchangeFailed(
                    "Failed to exchange token".to_string(),
                ));
            }
        };

        let token_hash = exchanged
            .token_hash
            .filter(|hash| !hash.is_empty())
            .ok_or(CallbackError::MalformedResponse)?;
        let payload = verify_signed_payload(&token_hash, &self.client_secret)?;

        store.store_tokens(&AuthTokens::from(&payload));
        Ok(payload)
    }

    /// Runs the callback and returns where the browser should go next.
    pub async fn handle(&self, params: &CallbackParams, store: &dyn TokenStore) -> String {
        match self.complete(params, store).await {
            Ok(payload) if payload.is_new_user => {
                info!("OAuth sign-in completed for a new user");
                self.paths.onboarding.clone()
            }
            Ok(_) => {
                info!("OAuth sign-in completed");
                self.paths.landing.clone()
            }
            Err(e) => {
                warn!("OAuth callback rejected: {}", e);
                self.error_location(&e.to_string())
            }
        }
    }

    pub fn error_location(&self, message: &str) -> String {
        format!("{}?message={}", self.paths.error, urlencoding::encode(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::encode_payload;
    use crate::store::memory_store::MemoryStore;
    use mockito::{Matcher, Server, ServerGuard};

    const SECRET: &str = "client-secret";

    fn callback(server: &ServerGuard) -> OAuthCallback {
        OAuthCallback::new(
            Arc::new(AuthApiClient::new(server.url())),
            SECRET,
            PathsConfig::default(),
        )
    }

    fn params(success: Option<&str>, key: Option<&str>, error_message: Option<&str>) -> CallbackParams {
        CallbackParams {
            success: success.map(str::to_string),
            key: key.map(str::to_string),
            error_message: error_message.map(str::to_string),
        }
    }

    fn stale_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.set_token(TokenKind::Access, "stale");
        store
    }

    async fn mock_exchange(server: &mut ServerGuard, token_hash: &str) -> mockito::Mock {
        server
            .mock("POST", "/auth/exchange-token")
            .match_body(Matcher::Json(serde_json::json!({ "key": "k1", "clientKey": SECRET })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::json!({ "success": true, "data": { "token_hash": token_hash } }).to_string())
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_missing_parameters() {
        let server = Server::new_async().await;
        let callback = callback(&server);
        let store = stale_store();

        assert_eq!(
            callback.handle(&params(None, Some("k1"), None), &store).await,
            "/auth/error?message=No%20success%20parameter%20provided"
        );
        assert_eq!(
            callback.handle(&params(Some("true"), None, None), &store).await,
            "/auth/error?message=No%20key%20parameter%20provided"
        );
        assert!(store.get_token(TokenKind::Access).is_none());
    }

    #[tokio::test]
    async fn test_denied_uses_error_message() {
        let mut server = Server::new_async().await;
        let exchange = server
            .mock("POST", "/auth/exchange-token")
            .expect(0)
            .create_async()
            .await;
        let callback = callback(&server);
        let store = stale_store();

        assert_eq!(
            callback
                .handle(&params(Some("false"), Some("k1"), Some("denied")), &store)
                .await,
            "/auth/error?message=denied"
        );
        assert_eq!(
            callback.handle(&params(Some("false"), Some("k1"), None), &store).await,
            "/auth/error?message=Authentication%20failed"
        );
        exchange.assert_async().await;
        assert_eq!(store.get_tokens(), Default::default());
    }

    #[tokio::test]
    async fn test_exchange_rejected_uses_server_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/exchange-token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": false, "error": "Key expired"}"#)
            .create_async()
            .await;
        let callback = callback(&server);
        let store = MemoryStore::new();

        let result = callback.complete(&params(Some("true"), Some("k1"), None), &store).await;
        assert_eq!(result, Err(CallbackError::ExchangeFailed("Key expired".to_string())));
    }

    #[tokio::test]
    async fn test_unsuccessful_ok_exchange_is_invalid_response() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/exchange-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": false, "error": "Key expired"}"#)
            .create_async()
            .await;
        let callback = callback(&server);
        let store = MemoryStore::new();

        let result = callback.complete(&params(Some("true"), Some("k1"), None), &store).await;
        assert_eq!(result, Err(CallbackError::MalformedResponse));
        assert_eq!(
            callback.handle(&params(Some("true"), Some("k1"), None), &store).await,
            "/auth/error?message=Invalid%20token%20response"
        );
    }

    #[tokio::test]
    async fn test_exchange_without_token_hash() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/exchange-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "data": {}}"#)
            .create_async()
            .await;
        let callback = callback(&server);
        let store = MemoryStore::new();

        assert_eq!(
            callback.handle(&params(Some("true"), Some("k1"), None), &store).await,
            "/auth/error?message=Invalid%20token%20response"
        );
    }

    #[tokio::test]
    async fn test_tampered_payload_leaves_store_untouched() {
        let mut server = Server::new_async().await;
        let genuine = encode_payload(r#"{"accessToken":"a1","isNewUser":false}"#, SECRET).unwrap();
        let (_, signature) = genuine.split_once('.').unwrap();
        let forged = encode_payload(r#"{"accessToken":"evil","isNewUser":false}"#, SECRET).unwrap();
        let (data, _) = forged.split_once('.').unwrap();
        mock_exchange(&mut server, &format!("{}.{}", data, signature)).await;

        let callback = callback(&server);
        let store = MemoryStore::new();
        assert_eq!(
            callback.handle(&params(Some("true"), Some("k1"), None), &store).await,
            "/auth/error?message=Invalid%20signature"
        );
        assert_eq!(store.get_tokens(), Default::default());
    }

    #[tokio::test]
    async fn test_new_user_goes_to_onboarding() {
        let mut server = Server::new_async().await;
        let envelope = encode_payload(
            r#"{"accessToken":"a1","refreshToken":"r1","isNewUser":true}"#,
            SECRET,
        )
        .unwrap();
        let exchange = mock_exchange(&mut server, &envelope).await;

        let callback = callback(&server);
        let store = stale_store();
        assert_eq!(
            callback.handle(&params(Some("true"), Some("k1"), None), &store).await,
            "/onboarding"
        );
        exchange.assert_async().await;
        assert_eq!(store.get_token(TokenKind::Access).as_deref(), Some("a1"));
        assert_eq!(store.get_token(TokenKind::Refresh).as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_returning_user_goes_to_landing() {
        let mut server = Server::new_async().await;
        let envelope = encode_payload(r#"{"accessToken":"a1","isNewUser":false}"#, SECRET).unwrap();
        mock_exchange(&mut server, &envelope).await;

        let callback = callback(&server);
        let store = MemoryStore::new();
        assert_eq!(
            callback.handle(&params(Some("true"), Some("k1"), None), &store).await,
            "/protected"
        );
        assert_eq!(store.get_token(TokenKind::Access).as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn test_unreachable_auth_server() {
        let callback = OAuthCallback::new(
            Arc::new(AuthApiClient::new("http://127.0.0.1:1")),
            SECRET,
            PathsConfig::default(),
        );
        let store = MemoryStore::new();
        assert_eq!(
            callback.handle(&params(Some("true"), Some("k1"), None), &store).await,
            "/auth/error?message=Failed%20to%20exchange%20token"
        );
    }
}
