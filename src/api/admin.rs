//! Admin API endpoints.
//!
//! All endpoints require admin role.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{AdminOnly, Auth};
use crate::db::{AccountStatus, Database, Role};
use crate::impl_has_auth_state;
use crate::jwt::JwtConfig;

/// State for admin endpoints.
#[derive(Clone)]
pub struct AdminState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_state!(AdminState);

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/members", get(list_members))
        .route("/members/{uuid}/role", put(set_role))
        .route("/members/{uuid}/status", put(set_status))
        .with_state(state)
}

/// List all members.
async fn list_members(
    State(state): State<AdminState>,
    _auth: Auth<AdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let members = state
        .db
        .credentials()
        .list()
        .await
        .store_err("Failed to list members")?;

    Ok(Json(members))
}

#[derive(Deserialize)]
struct SetRoleRequest {
    role: Role,
}

/// Change a member's role.
async fn set_role(
    State(state): State<AdminState>,
    auth: Auth<AdminOnly>,
    Path(uuid): Path<String>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    if auth.user.subject() == uuid {
        return Err(ApiError::forbidden("Cannot change your own role"));
    }

    let updated = state
        .db
        .credentials()
        .set_role(&uuid, payload.role)
        .await
        .store_err("Failed to update role")?;

    if !updated {
        return Err(ApiError::not_found("Member not found"));
    }

    info!(subject = %uuid, role = payload.role.as_str(), "Role changed");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct SetStatusRequest {
    status: AccountStatus,
}

/// Change a member's account status.
async fn set_status(
    State(state): State<AdminState>,
    auth: Auth<AdminOnly>,
    Path(uuid): Path<String>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    if auth.user.subject() == uuid {
        return Err(ApiError::forbidden("Cannot change your own status"));
    }

    let updated = state
        .db
        .credentials()
        .set_status(&uuid, payload.status)
        .await
        .store_err("Failed to update status")?;

    if !updated {
        return Err(ApiError::not_found("Member not found"));
    }

    info!(subject = %uuid, status = payload.status.as_str(), "Status changed");

    Ok(StatusCode::NO_CONTENT)
}
