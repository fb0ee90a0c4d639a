pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod rate_limit;

use api::create_api_router;
use auth::{PolicyEnforcer, PolicyMap, enforce_route_policy};
use axum::{Json, Router, middleware, routing::get};
use cli::IpExtractor;
use db::Database;
use jwt::JwtConfig;
use rate_limit::{RateLimitState, RateLimits};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// IP extraction strategy (requires running behind a proxy)
    pub ip_extractor: Option<IpExtractor>,
    /// Route policy table; None uses the standard API table
    pub route_policies: Option<PolicyMap>,
    /// Shared rate limiter state
    pub rate_limits: RateLimits,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret));

    let rate_limits = RateLimitState {
        limits: config.rate_limits.clone(),
        ip_extractor: config.ip_extractor.clone(),
    };

    let api_router = create_api_router(config.db.clone(), jwt.clone(), rate_limits);

    let policies = Arc::new(
        config
            .route_policies
            .clone()
            .unwrap_or_else(PolicyMap::default_api),
    );
    let enforcer = PolicyEnforcer {
        jwt,
        db: config.db.clone(),
        policies,
    };

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_router)
        .layer(middleware::from_fn_with_state(
            enforcer,
            enforce_route_policy,
        ))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run the server on the given listener. This function blocks until the
/// server exits. Spawns the rate-limit cleanup scheduler.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    cleanup::spawn_cleanup_scheduler(config.rate_limits.clone());
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let
/// the OS choose a random port. Returns the actual address the server is
/// listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> (tokio::task::JoinHandle<()>, SocketAddr) {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
    let local_addr = listener.local_addr().expect("Failed to get local address");

    let handle = tokio::spawn(async move {
        run_server(config, listener).await.ok();
    });

    (handle, local_addr)
}
