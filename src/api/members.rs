//! Member self-service endpoints.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use bcrypt::DEFAULT_COST;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt};
use crate::auth::Auth;
use crate::db::{AccountStatus, Credential, Database, Role};
use crate::impl_has_auth_state;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct MembersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_state!(MembersState);

pub fn router(state: MembersState) -> Router {
    Router::new()
        .route("/me", get(me))
        .route("/me/password", put(change_password))
        .with_state(state)
}

#[derive(Serialize)]
struct ProfileResponse {
    uuid: String,
    name: String,
    email: String,
    role: Role,
    status: AccountStatus,
}

impl From<Credential> for ProfileResponse {
    fn from(credential: Credential) -> Self {
        Self {
            uuid: credential.uuid,
            name: credential.name,
            email: credential.email,
            role: credential.role,
            status: credential.status,
        }
    }
}

/// Profile of the calling member.
async fn me(
    State(state): State<MembersState>,
    auth: Auth,
) -> Result<impl IntoResponse, ApiError> {
    let credential = state
        .db
        .credentials()
        .find_by_uuid(auth.user.subject())
        .await
        .store_err("Failed to look up credential")?
        .ok_or_else(|| ApiError::unauthorized("Unknown subject"))?;

    Ok(Json(ProfileResponse::from(credential)))
}

#[derive(Deserialize)]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

/// Self password update. Requires the current password.
async fn change_password(
    State(state): State<MembersState>,
    auth: Auth,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.new_password.len() < 8 {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }
    if payload.new_password.len() > 128 {
        return Err(ApiError::bad_request(
            "Password cannot be longer than 128 characters",
        ));
    }

    let credential = state
        .db
        .credentials()
        .find_by_uuid(auth.user.subject())
        .await
        .store_err("Failed to look up credential")?
        .ok_or_else(|| ApiError::unauthorized("Unknown subject"))?;

    let valid = bcrypt::verify(&payload.current_password, &credential.password_hash)
        .internal_err("Failed to verify password")?;

    if !valid {
        return Err(ApiError::forbidden("Current password is incorrect"));
    }

    let password_hash =
        bcrypt::hash(&payload.new_password, DEFAULT_COST).internal_err("Failed to hash password")?;

    state
        .db
        .credentials()
        .set_password_hash(&credential.uuid, &password_hash)
        .await
        .store_err("Failed to update password")?;

    info!(subject = %credential.uuid, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}
