//! Axum extractors for authentication.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::bearer::bearer_token;
use super::errors::{AuthError, AuthErrorKind};
use super::state::HasAuthState;
use super::types::AuthenticatedUser;
use crate::db::{AccountStatus, Credential, Database, Role};
use crate::jwt::JwtConfig;

/// Verify the bearer token on a request and build the identity it asserts.
pub(crate) fn verify_bearer(
    jwt: &JwtConfig,
    headers: &axum::http::HeaderMap,
) -> Result<AuthenticatedUser, AuthErrorKind> {
    let token = bearer_token(headers).ok_or(AuthErrorKind::NotAuthenticated)?;
    let claims = jwt.verify(token).map_err(|e| AuthErrorKind::from(&e))?;
    Ok(AuthenticatedUser { claims })
}

/// Fetch the stored credential for a subject and require an active account.
pub(crate) async fn fresh_credential(
    db: &Database,
    subject: &str,
) -> Result<Credential, AuthErrorKind> {
    let credential = db
        .credentials()
        .find_by_uuid(subject)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Credential lookup failed");
            AuthErrorKind::StoreUnavailable
        })?
        .ok_or(AuthErrorKind::CredentialNotFound)?;

    if credential.status != AccountStatus::Active {
        return Err(AuthErrorKind::AccountDisabled);
    }

    Ok(credential)
}

/// Core authentication logic shared by the extractors. Reuses an identity
/// already attached by the route-policy middleware; verifies the bearer
/// header itself when the extractor is used on a route outside the policy
/// map.
fn authenticate<S>(parts: &Parts, state: &S) -> Result<AuthenticatedUser, AuthErrorKind>
where
    S: HasAuthState,
{
    if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
        return Ok(user.clone());
    }
    verify_bearer(state.jwt(), &parts.headers)
}

/// Role requirement checked by the `Auth` extractor.
pub trait RoleConstraint {
    /// Whether the stored credential must be re-read (status and role)
    /// instead of trusting the token alone.
    const FRESH_CREDENTIAL: bool;

    fn allows(role: Role) -> bool;
}

/// Any authenticated member. The token alone is trusted; role or status
/// changes take effect at re-authentication.
pub struct AnyRole;

impl RoleConstraint for AnyRole {
    const FRESH_CREDENTIAL: bool = false;

    fn allows(_role: Role) -> bool {
        true
    }
}

/// Admin only. The stored credential is re-read so a demoted or suspended
/// admin loses access immediately instead of at token expiry.
pub struct AdminOnly;

impl RoleConstraint for AdminOnly {
    const FRESH_CREDENTIAL: bool = true;

    fn allows(role: Role) -> bool {
        role == Role::Admin
    }
}

/// Extractor for endpoints that require authentication.
///
/// `Auth` accepts any authenticated member; `Auth<AdminOnly>` additionally
/// requires the admin role.
pub struct Auth<C: RoleConstraint = AnyRole> {
    pub user: AuthenticatedUser,
    _constraint: PhantomData<C>,
}

impl<S, C> FromRequestParts<S> for Auth<C>
where
    S: HasAuthState + Send + Sync,
    C: RoleConstraint + Send,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).map_err(AuthError::new)?;

        if !C::allows(user.role()) {
            return Err(AuthError::new(AuthErrorKind::InsufficientRole));
        }

        if C::FRESH_CREDENTIAL {
            let credential = fresh_credential(state.db(), user.subject())
                .await
                .map_err(AuthError::new)?;
            if !C::allows(credential.role) {
                return Err(AuthError::new(AuthErrorKind::InsufficientRole));
            }
        }

        Ok(Auth {
            user,
            _constraint: PhantomData,
        })
    }
}

/// Optional authentication extractor - never fails, returns
/// `Option<AuthenticatedUser>`. Useful for endpoints that work both
/// authenticated and anonymous.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: HasAuthState + Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(authenticate(parts, state).ok()))
    }
}
