pub mod base;
pub mod cookie_store;
pub mod encoded_store;
pub mod memory_store;
pub mod no_store;

// Re-export the primary store items so code outside can do
// "use crate::store::{TokenStore, create_store};"
pub use base::{create_store, StoreFactory, TokenStore};
