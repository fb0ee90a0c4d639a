//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::jwt::JwtError;

/// Internal auth error kind used by the core authentication logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// No bearer token on a protected route
    NotAuthenticated,
    /// Token expiry has passed
    TokenExpired,
    /// Token signature does not match the server secret
    InvalidSignature,
    /// Token is not well-formed
    MalformedToken,
    /// Token subject no longer exists in the credential store
    CredentialNotFound,
    /// Stored account status is not active
    AccountDisabled,
    /// Valid identity, insufficient role
    InsufficientRole,
    /// Credential store unreachable
    StoreUnavailable,
}

impl From<&JwtError> for AuthErrorKind {
    fn from(e: &JwtError) -> Self {
        match e {
            JwtError::Expired => AuthErrorKind::TokenExpired,
            JwtError::InvalidSignature => AuthErrorKind::InvalidSignature,
            _ => AuthErrorKind::MalformedToken,
        }
    }
}

/// Authentication failure, rendered as a stable JSON error response.
#[derive(Debug)]
pub struct AuthError {
    kind: AuthErrorKind,
}

impl AuthError {
    pub(crate) fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    fn status_code(&self) -> StatusCode {
        match self.kind {
            AuthErrorKind::NotAuthenticated
            | AuthErrorKind::TokenExpired
            | AuthErrorKind::InvalidSignature
            | AuthErrorKind::MalformedToken
            | AuthErrorKind::CredentialNotFound => StatusCode::UNAUTHORIZED,
            AuthErrorKind::AccountDisabled | AuthErrorKind::InsufficientRole => {
                StatusCode::FORBIDDEN
            }
            AuthErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::NotAuthenticated => "Not authenticated",
            AuthErrorKind::TokenExpired => "Token expired",
            AuthErrorKind::InvalidSignature => "Invalid token signature",
            AuthErrorKind::MalformedToken => "Malformed token",
            AuthErrorKind::CredentialNotFound => "Unknown subject",
            AuthErrorKind::AccountDisabled => "Account is not active",
            AuthErrorKind::InsufficientRole => "Insufficient permissions",
            AuthErrorKind::StoreUnavailable => "Credential store unavailable",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
