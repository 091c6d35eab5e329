use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::TokenEntry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// The caller behind an accepted bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resolves a raw bearer token to a principal.
pub trait CredentialVerifier: Send + Sync {
    /// Returns `None` when the token is not recognised.
    fn verify(&self, token: &str) -> Option<Principal>;
}

/// Fixed token allow-list held in memory.
#[derive(Debug, Clone)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenVerifier {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    /// Adds (or replaces) a token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user_id: i64, role: Role) -> Self {
        self.tokens
            .insert(token.into(), Principal { user_id, role });
        self
    }

    /// The built-in allow-list extended with configured tokens.
    #[must_use]
    pub fn from_entries(entries: &[TokenEntry]) -> Self {
        entries.iter().fold(Self::default(), |verifier, entry| {
            verifier.with_token(entry.token.clone(), entry.user_id, entry.role)
        })
    }
}

impl Default for StaticTokenVerifier {
    fn default() -> Self {
        Self::empty()
            .with_token("test-token", 1, Role::User)
            .with_token("admin-token", 2, Role::Admin)
            .with_token("user-token", 3, Role::User)
    }
}

impl CredentialVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Option<Principal> {
        self.tokens.get(token).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allow_list() {
        let verifier = StaticTokenVerifier::default();

        let admin = verifier.verify("admin-token").unwrap();
        assert_eq!(admin.user_id, 2);
        assert!(admin.is_admin());

        let user = verifier.verify("test-token").unwrap();
        assert_eq!(user, Principal { user_id: 1, role: Role::User });
        assert_eq!(verifier.verify("user-token").unwrap().user_id, 3);

        assert!(verifier.verify("bogus").is_none());
        assert!(verifier.verify("").is_none());
        assert!(verifier.verify("Admin-Token").is_none());
    }

    #[test]
    fn test_configured_tokens_extend_defaults() {
        let verifier = StaticTokenVerifier::from_entries(&[TokenEntry {
            token: "field-tablet".to_string(),
            user_id: 7,
            role: Role::Admin,
        }]);

        assert!(verifier.verify("field-tablet").unwrap().is_admin());
        assert!(verifier.verify("test-token").is_some());
    }
}
