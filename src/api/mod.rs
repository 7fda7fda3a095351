//! Client for the external auth server.

pub mod client;
pub mod error;

pub use client::AuthApiClient;
pub use error::ApiError;
