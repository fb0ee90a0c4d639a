//! Route-level authorization policy.
//!
//! Every request passes through `enforce_route_policy`: the request path is
//! matched against a configured `PolicyMap` and the request either proceeds
//! (with the verified identity attached to its extensions) or is rejected
//! with a stable auth error. Handlers read the identity through the
//! extractors in `super::extractors`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::errors::{AuthError, AuthErrorKind};
use super::extractors::{fresh_credential, verify_bearer};
use crate::db::{Database, Role};
use crate::jwt::JwtConfig;

/// Access requirement for a group of routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePolicy {
    /// No authentication required; a valid token is still attached if present.
    Public,
    /// Any authenticated member.
    AuthenticatedAny,
    /// Admin role, re-checked against the credential store.
    AdminOnly,
}

/// Path-prefix to policy mapping with a default for unmatched paths.
/// The longest matching prefix wins; prefixes match whole path segments,
/// so `/api/admin` covers `/api/admin` and `/api/admin/members` but not
/// `/api/administrivia`.
#[derive(Debug, Clone)]
pub struct PolicyMap {
    rules: Vec<(String, RoutePolicy)>,
    default_policy: RoutePolicy,
}

impl PolicyMap {
    pub fn new(default_policy: RoutePolicy) -> Self {
        Self {
            rules: Vec::new(),
            default_policy,
        }
    }

    pub fn route(mut self, prefix: impl Into<String>, policy: RoutePolicy) -> Self {
        self.rules.push((prefix.into(), policy));
        self
    }

    /// The standard table for this crate's API surface.
    pub fn default_api() -> Self {
        Self::new(RoutePolicy::AuthenticatedAny)
            .route("/healthz", RoutePolicy::Public)
            .route("/api/auth", RoutePolicy::Public)
            .route("/api/admin", RoutePolicy::AdminOnly)
    }

    pub fn policy_for(&self, path: &str) -> RoutePolicy {
        self.rules
            .iter()
            .filter(|(prefix, _)| prefix_matches(prefix, path))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, policy)| *policy)
            .unwrap_or(self.default_policy)
    }
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// State for the route-policy middleware.
#[derive(Clone)]
pub struct PolicyEnforcer {
    pub jwt: Arc<JwtConfig>,
    pub db: Database,
    pub policies: Arc<PolicyMap>,
}

/// Middleware enforcing the route policy for every inbound request.
pub async fn enforce_route_policy(
    State(enforcer): State<PolicyEnforcer>,
    mut request: Request,
    next: Next,
) -> Response {
    let policy = enforcer.policies.policy_for(request.uri().path());

    let identity = verify_bearer(&enforcer.jwt, request.headers());

    match policy {
        RoutePolicy::Public => {
            // An invalid or missing token on a public route is not an error;
            // a valid one is attached so optional-auth handlers can see it.
            if let Ok(user) = identity {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        RoutePolicy::AuthenticatedAny => match identity {
            Ok(user) => {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            Err(kind) => AuthError::new(kind).into_response(),
        },
        RoutePolicy::AdminOnly => {
            let user = match identity {
                Ok(user) => user,
                Err(kind) => return AuthError::new(kind).into_response(),
            };
            if !user.is_admin() {
                return AuthError::new(AuthErrorKind::InsufficientRole).into_response();
            }
            match fresh_credential(&enforcer.db, user.subject()).await {
                Ok(credential) if credential.role == Role::Admin => {
                    request.extensions_mut().insert(user);
                    next.run(request).await
                }
                Ok(_) => AuthError::new(AuthErrorKind::InsufficientRole).into_response(),
                Err(kind) => AuthError::new(kind).into_response(),
            }
        }
    }
}
