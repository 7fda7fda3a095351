//! Signed envelope format: `base64(json) "." base64(hmac_sha512(json, secret))`.
//!
//! The signature covers the exact JSON text that was encoded, so it is
//! verified before the JSON is parsed.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha512;

use super::CallbackError;
use crate::models::TokenExchangePayload;

type HmacSha512 = Hmac<Sha512>;

fn mac(secret: &str) -> Result<HmacSha512, CallbackError> {
    HmacSha512::new_from_slice(secret.as_bytes()).map_err(|_| CallbackError::InvalidSignature)
}

/// Base64-encoded HMAC-SHA-512 of `data`.
pub fn sign(data: &str, secret: &str) -> Result<String, CallbackError> {
    let mut mac = mac(secret)?;
    mac.update(data.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Produces a signed envelope for `json`, the way the auth server does.
pub fn encode_payload(json: &str, secret: &str) -> Result<String, CallbackError> {
    Ok(format!("{}.{}", STANDARD.encode(json), sign(json, secret)?))
}

/// Checks the envelope signature and decodes its payload.
pub fn verify_signed_payload(
    token_hash: &str,
    secret: &str,
) -> Result<TokenExchangePayload, CallbackError> {
    let (data_segment, signature) = token_hash
        .split_once('.')
        .ok_or(CallbackError::MalformedResponse)?;

    let json = STANDARD
        .decode(data_segment)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or(CallbackError::MalformedResponse)?;

    let signature = STANDARD
        .decode(signature)
        .map_err(|_| CallbackError::InvalidSignature)?;

    let mut mac = mac(secret)?;
    mac.update(json.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| CallbackError::InvalidSignature)?;

    serde_json::from_str(&json).map_err(|_| CallbackError::MalformedResponse)
}
