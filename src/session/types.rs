// ABOUTME: Session data types: the user identity record and the auth snapshot.
// ABOUTME: Authentication is derived from the snapshot, never stored separately.

use serde::{Deserialize, Serialize};

/// Identity record of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Immutable snapshot of the authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    /// True until the store has been hydrated or explicitly mutated.
    /// Consumers must treat this as "unknown", not "signed out".
    pub is_loading: bool,
}

impl Session {
    /// State before hydration.
    pub fn unloaded() -> Self {
        Self {
            user: None,
            token: None,
            is_loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            user: None,
            token: None,
            is_loading: false,
        }
    }

    pub fn authenticated(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            is_loading: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}
