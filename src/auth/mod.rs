mod helpers;
mod middleware;
mod verifier;

pub use helpers::{HeaderError, KEY_ID_HEADER, extract_bearer_token};
pub use middleware::{AuthError, OptionalAuth, RequireAdmin, RequireAuth};
pub use verifier::{CredentialVerifier, Principal, Role, StaticTokenVerifier};
