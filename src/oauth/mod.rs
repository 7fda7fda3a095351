//! Completion of OAuth sign-ins: the signed token-exchange envelope and the
//! callback procedure that verifies it.

pub mod callback;
pub mod signature;

pub use callback::{CallbackError, CallbackParams, OAuthCallback};
pub use signature::{encode_payload, sign, verify_signed_payload};
