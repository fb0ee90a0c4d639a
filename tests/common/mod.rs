#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use clubdesk::{
    ServerConfig,
    cli::{ClientIpHeader, IpExtractor},
    create_app,
    db::{Database, Role},
    jwt::JwtConfig,
    rate_limit::RateLimits,
};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret-0123456789abcdef";

/// Create a test app over an in-memory database, reading client IPs from
/// X-Forwarded-For. Returns (app, db, jwt) so tests can seed data and craft
/// tokens directly.
pub async fn create_test_app() -> (Router, Database, JwtConfig) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let jwt = JwtConfig::new(TEST_JWT_SECRET);
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_JWT_SECRET.to_vec(),
        ip_extractor: Some(IpExtractor::from(ClientIpHeader::XForwardedFor)),
        route_policies: None,
        rate_limits: RateLimits::new(),
    };
    (create_app(&config), db, jwt)
}

/// Send a JSON request. `ip` becomes the X-Forwarded-For value.
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
    ip: &str,
    token: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn send_get(app: &Router, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", "198.51.100.1");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// Read a JSON response body.
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a member through the API and return (uuid, token).
/// Registration is rate limited per IP, so callers pass distinct IPs.
pub async fn register_member(
    app: &Router,
    name: &str,
    email: &str,
    password: &str,
    ip: &str,
) -> (String, String) {
    let response = send_json(
        app,
        "POST",
        "/api/auth/register",
        serde_json::json!({ "name": name, "email": email, "password": password }),
        ip,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    (
        body["subject"]["uuid"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// Seed an admin directly in the store and return (uuid, token).
pub async fn seed_admin(db: &Database, jwt: &JwtConfig, email: &str) -> (String, String) {
    let uuid = uuid::Uuid::new_v4().to_string();
    let hash = bcrypt::hash("admin-password-123", bcrypt::DEFAULT_COST).unwrap();
    db.credentials()
        .create_admin(&uuid, "Admin", email, &hash)
        .await
        .unwrap();
    let token = jwt.issue(&uuid, Role::Admin).unwrap().token;
    (uuid, token)
}
