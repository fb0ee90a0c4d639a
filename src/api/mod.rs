mod admin;
mod auth;
mod error;
mod members;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitState;

pub use error::{ApiError, ResultExt, validate_uuid};

/// Create the API router.
pub fn create_api_router(db: Database, jwt: Arc<JwtConfig>, rate_limits: RateLimitState) -> Router {
    let auth_state = auth::AuthApiState {
        db: db.clone(),
        jwt: jwt.clone(),
        rate_limits,
    };

    let members_state = members::MembersState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let admin_state = admin::AdminState { db, jwt };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .nest("/members", members::router(members_state))
        .nest("/admin", admin::router(admin_state))
}
