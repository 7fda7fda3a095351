pub mod api;
pub mod identity;
pub mod profile;
pub mod tokens;

pub use api::*;
pub use identity::{IdentityUser, RequestIdentity};
pub use profile::{OAuthProvider, UserProfile};
pub use tokens::{AuthTokens, StoredTokens, TokenExchangePayload, TokenKind};
