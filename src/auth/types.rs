//! Authenticated identity types.

use crate::db::Role;
use crate::jwt::Claims;

/// Verified identity attached to a request by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Claims from the verified bearer token
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn is_admin(&self) -> bool {
        self.claims.role == Role::Admin
    }
}
