//! Session lifecycle: observable auth state, the orchestrator that drives
//! it, route guards, and request-scoped identity.

pub mod guards;
pub mod identity;
pub mod manager;
pub mod state;

pub use guards::{protected_guard, protected_load, public_only_guard, public_only_load, GuardRedirect};
pub use identity::resolve_identity;
pub use manager::SessionManager;
pub use state::{AuthState, AuthStore, SessionStatus};
