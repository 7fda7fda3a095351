use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use crate::api::AuthApiClient;
use crate::models::{RequestIdentity, TokenKind};
use crate::state::AppState;
use crate::utils::log_throttle::LogThrottle;

/// Middleware that attaches exactly one `RequestIdentity` to every request.
///
/// The access token comes from the configured token store, falling back to an
/// `Authorization: Bearer` header. Validation failures of any kind leave the
/// request anonymous.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = state
        .stores
        .for_request(request.headers())
        .get_token(TokenKind::Access)
        .or_else(|| bearer_token(request.headers()));

    let identity = match token {
        Some(token) => validate(&state.api, &state.validation_log, &token).await,
        None => RequestIdentity::anonymous(),
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

async fn validate(api: &AuthApiClient, failures: &LogThrottle, token: &str) -> RequestIdentity {
    match api.validate_token(token).await {
        Ok(response) => match response.into_result("Token validation failed") {
            Ok(validation) => RequestIdentity::from_validation(validation),
            Err(e) => {
                debug!("Token rejected by auth server: {}", e);
                RequestIdentity::anonymous()
            }
        },
        Err(e) => {
            if let Some(suppressed) = failures.admit(e.kind()) {
                warn!(
                    failure = e.kind(),
                    suppressed,
                    "Token validation failed, request continues anonymously: {}",
                    e
                );
            }
            RequestIdentity::anonymous()
        }
    }
}

/// Handlers take the identity as an extractor. Routes outside the identity
/// layer see an anonymous request.
#[async_trait]
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestIdentity>()
            .cloned()
            .unwrap_or_else(RequestIdentity::anonymous))
    }
}
