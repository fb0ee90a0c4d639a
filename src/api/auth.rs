//! Authentication endpoints: login, registration, password reset, session.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use bcrypt::DEFAULT_COST;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use super::error::{ApiError, ResultExt};
use crate::auth::OptionalAuth;
use crate::db::{AccountStatus, Credential, Database, Role};
use crate::impl_has_auth_state;
use crate::jwt::JwtConfig;
use crate::rate_limit::{
    RateLimitState, rate_limit_forgot_password, rate_limit_login, rate_limit_register,
};

/// All login failures share this message so the response does not reveal
/// whether the email exists.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone)]
pub struct AuthApiState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub rate_limits: RateLimitState,
}

impl_has_auth_state!(AuthApiState);

pub fn router(state: AuthApiState) -> Router {
    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limits.clone(),
            rate_limit_login,
        ));

    let register_router = Router::new()
        .route("/register", post(register))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limits.clone(),
            rate_limit_register,
        ));

    let forgot_router = Router::new()
        .route("/forgot-password", post(forgot_password))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limits.clone(),
            rate_limit_forgot_password,
        ));

    let session_router = Router::new()
        .route("/session", get(session))
        .with_state(state);

    Router::new()
        .merge(login_router)
        .merge(register_router)
        .merge(forgot_router)
        .merge(session_router)
}

/// Public view of the authenticated subject.
#[derive(Serialize)]
struct SubjectResponse {
    uuid: String,
    name: String,
    email: String,
    role: Role,
}

impl From<&Credential> for SubjectResponse {
    fn from(credential: &Credential) -> Self {
        Self {
            uuid: credential.uuid.clone(),
            name: credential.name.clone(),
            email: credential.email.clone(),
            role: credential.role,
        }
    }
}

#[derive(Serialize)]
struct AuthResponse {
    token: String,
    expires_in: u64,
    subject: SubjectResponse,
}

/// Fixed bcrypt hash verified on the unknown-email path, so unknown emails
/// cost the same as wrong passwords and the two are indistinguishable by
/// timing.
fn dummy_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| bcrypt::hash("clubdesk-dummy-password", DEFAULT_COST).unwrap_or_default())
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AuthApiState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();

    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let credential = state
        .db
        .credentials()
        .find_by_email(email)
        .await
        .store_err("Failed to look up credential")?;

    let Some(credential) = credential else {
        let _ = bcrypt::verify(&payload.password, dummy_hash());
        warn!(email = %email, "Failed login attempt");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let valid = bcrypt::verify(&payload.password, &credential.password_hash)
        .internal_err("Failed to verify password")?;

    if !valid {
        warn!(email = %email, "Failed login attempt");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    if credential.status != AccountStatus::Active {
        warn!(subject = %credential.uuid, "Login rejected for non-active account");
        return Err(ApiError::forbidden("Account is not active"));
    }

    let issued = state
        .jwt
        .issue(&credential.uuid, credential.role)
        .internal_err("Failed to issue token")?;

    info!(subject = %credential.uuid, "Login");

    Ok(Json(AuthResponse {
        token: issued.token,
        expires_in: issued.duration,
        subject: SubjectResponse::from(&credential),
    }))
}

#[derive(Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::bad_request("Email cannot be empty"));
    }
    if email.len() > 254 {
        return Err(ApiError::bad_request("Email is too long"));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }
    if password.len() > 128 {
        return Err(ApiError::bad_request(
            "Password cannot be longer than 128 characters",
        ));
    }
    Ok(())
}

async fn register(
    State(state): State<AuthApiState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim();

    if name.is_empty() {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }
    if name.len() > 64 {
        return Err(ApiError::bad_request(
            "Name cannot be longer than 64 characters",
        ));
    }
    validate_email(email)?;
    validate_password(&payload.password)?;

    let available = state
        .db
        .credentials()
        .email_available(email)
        .await
        .store_err("Failed to check email availability")?;

    if !available {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let password_hash =
        bcrypt::hash(&payload.password, DEFAULT_COST).internal_err("Failed to hash password")?;

    let uuid = uuid::Uuid::new_v4().to_string();

    state
        .db
        .credentials()
        .create(&uuid, name, email, &password_hash)
        .await
        .store_err("Failed to create credential")?;

    let issued = state
        .jwt
        .issue(&uuid, Role::Member)
        .internal_err("Failed to issue token")?;

    info!(subject = %uuid, "Member registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: issued.token,
            expires_in: issued.duration,
            subject: SubjectResponse {
                uuid,
                name: name.to_string(),
                email: email.to_string(),
                role: Role::Member,
            },
        }),
    ))
}

#[derive(Deserialize)]
struct ForgotPasswordRequest {
    email: String,
}

#[derive(Serialize)]
struct ForgotPasswordResponse {
    message: &'static str,
}

/// Accepts a reset request and returns the same response whether or not the
/// email exists. Delivery of the reset mail is an external concern.
async fn forgot_password(
    State(_state): State<AuthApiState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();
    validate_email(email)?;

    tracing::debug!("Password reset requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(ForgotPasswordResponse {
            message: "If the account exists, a reset link has been sent.",
        }),
    ))
}

#[derive(Serialize)]
struct SessionIdentity {
    uuid: String,
    role: Role,
}

#[derive(Serialize)]
struct SessionResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<SessionIdentity>,
}

/// Report who the caller is, if anyone. Never fails; anonymous callers get
/// `authenticated: false`.
async fn session(
    State(_state): State<AuthApiState>,
    OptionalAuth(user): OptionalAuth,
) -> Json<SessionResponse> {
    let subject = user.map(|user| SessionIdentity {
        uuid: user.claims.sub.clone(),
        role: user.claims.role,
    });

    Json(SessionResponse {
        authenticated: subject.is_some(),
        subject,
    })
}
