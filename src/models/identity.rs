use serde::Serialize;

use super::{TokenValidation, UserProfile};

/// The subset of the user exposed to server-rendered pages.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    pub user_id: String,
    pub email: String,
    pub full_name: String,
    pub is_verified: bool,
}

/// Request-scoped identity, established once per request by validating the
/// request's access token. It does not create or touch a session.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdentity {
    pub is_authenticated: bool,
    pub user: Option<IdentityUser>,
}

impl RequestIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builds an identity from a validation result. Anything short of a
    /// valid token carrying a user id is anonymous.
    pub fn from_validation(validation: TokenValidation) -> Self {
        match (validation.valid, validation.user_id) {
            (true, Some(user_id)) => RequestIdentity {
                is_authenticated: true,
                user: Some(IdentityUser {
                    user_id,
                    email: validation.email.unwrap_or_default(),
                    full_name: validation.full_name.unwrap_or_default(),
                    is_verified: validation.is_verified.unwrap_or(false),
                }),
            },
            _ => Self::anonymous(),
        }
    }
}

impl From<&IdentityUser> for UserProfile {
    fn from(user: &IdentityUser) -> Self {
        UserProfile {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar_url: None,
            is_verified: user.is_verified,
            linked_providers: Default::default(),
        }
    }
}
