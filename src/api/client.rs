use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::ApiError;
use crate::models::{
    ActiveSession, ApiResponse, AuthTokens, Empty, LoginCredentials, OAuthProvider, OAuthUrl,
    RegisterCredentials, TokenExchangeData, TokenValidation, UpdateProfileData, UserProfile,
};

/// Stateless wrapper around the auth server endpoints. Every method is a
/// single request/response; retry policy belongs to the caller.
#[derive(Clone, Debug)]
pub struct AuthApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl AuthApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        AuthApiClient {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("Auth API request: {} {}", method, url);
        let builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and decodes the envelope. Only JSON bodies are
    /// accepted, whatever the status code.
    async fn dispatch<T: DeserializeOwned>(
        builder: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.contains("application/json"))
            .unwrap_or(false);

        if !is_json {
            return Err(ApiError::UnexpectedFormat {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let mut envelope: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        envelope.http_status = Some(status.as_u16());
        Ok(envelope)
    }

    pub async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> Result<ApiResponse<AuthTokens>, ApiError> {
        let builder = self.request(Method::POST, "/auth/register", None);
        Self::dispatch(builder.json(credentials)).await
    }

    pub async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<ApiResponse<AuthTokens>, ApiError> {
        let builder = self.request(Method::POST, "/auth/login", None);
        Self::dispatch(builder.json(credentials)).await
    }

    pub async fn logout(&self, token: Option<&str>) -> Result<ApiResponse<Empty>, ApiError> {
        Self::dispatch(self.request(Method::POST, "/auth/logout", token)).await
    }

    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<ApiResponse<AuthTokens>, ApiError> {
        let builder = self.request(Method::POST, "/auth/refresh-token", None);
        Self::dispatch(builder.json(&json!({ "refreshToken": refresh_token }))).await
    }

    pub async fn get_profile(&self, token: &str) -> Result<ApiResponse<UserProfile>, ApiError> {
        Self::dispatch(self.request(Method::GET, "/auth/profile", Some(token))).await
    }

    pub async fn update_profile(
        &self,
        data: &UpdateProfileData,
        token: &str,
    ) -> Result<ApiResponse<UserProfile>, ApiError> {
        let builder = self.request(Method::PUT, "/auth/profile", Some(token));
        Self::dispatch(builder.json(data)).await
    }

    pub async fn get_sessions(
        &self,
        token: &str,
    ) -> Result<ApiResponse<Vec<ActiveSession>>, ApiError> {
        Self::dispatch(self.request(Method::GET, "/auth/sessions", Some(token))).await
    }

    pub async fn revoke_session(
        &self,
        session_id: &str,
        token: &str,
    ) -> Result<ApiResponse<Empty>, ApiError> {
        let path = format!("/auth/sessions/{}", urlencoding::encode(session_id));
        Self::dispatch(self.request(Method::DELETE, &path, Some(token))).await
    }

    /// Revokes every session except the one `token` belongs to.
    pub async fn revoke_other_sessions(
        &self,
        token: &str,
    ) -> Result<ApiResponse<Empty>, ApiError> {
        Self::dispatch(self.request(Method::DELETE, "/auth/sessions", Some(token))).await
    }

    pub async fn get_oauth_url(
        &self,
        provider: OAuthProvider,
    ) -> Result<ApiResponse<OAuthUrl>, ApiError> {
        let path = format!("/auth/oauth/{}", provider);
        Self::dispatch(self.request(Method::GET, &path, None)).await
    }

    pub async fn unlink_provider(
        &self,
        provider: OAuthProvider,
        token: &str,
    ) -> Result<ApiResponse<Empty>, ApiError> {
        let path = format!("/auth/oauth/unlink/{}", provider);
        Self::dispatch(self.request(Method::DELETE, &path, Some(token))).await
    }

    pub async fn validate_token(
        &self,
        token: &str,
    ) -> Result<ApiResponse<TokenValidation>, ApiError> {
        Self::dispatch(self.request(Method::GET, "/auth/validate", Some(token))).await
    }

    /// Trades a one-time OAuth `key` for the signed token envelope. The
    /// server invalidates the key on first use, so this must not be retried.
    pub async fn exchange_token(
        &self,
        key: &str,
        client_secret: &str,
    ) -> Result<ApiResponse<TokenExchangeData>, ApiError> {
        let builder = self.request(Method::POST, "/auth/exchange-token", None);
        let body = json!({ "key": key, "clientKey": client_secret });
        Self::dispatch(builder.json(&body)).await
    }

    /// Hands a provider's authorization code to the auth server.
    pub async fn forward_oauth_callback(
        &self,
        provider: OAuthProvider,
        code: &str,
        state: &str,
    ) -> Result<ApiResponse<AuthTokens>, ApiError> {
        let path = format!(
            "/auth/oauth/callback/{}?code={}&state={}",
            provider,
            urlencoding::encode(code),
            urlencoding::encode(state)
        );
        Self::dispatch(self.request(Method::GET, &path, None)).await
    }
}
