//! Tests for login, registration, and password-reset rate limiting.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::*;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_login_rate_limit() {
    let (app, _db, _jwt) = create_test_app().await;

    // 10 attempts are answered normally (401 here, nobody is registered)
    for _ in 0..10 {
        let response = send_json(
            &app,
            "POST",
            "/api/auth/login",
            json!({ "email": "nobody@club.test", "password": "wrong-password" }),
            "198.51.100.77",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // The 11th within the window is rejected with retry guidance
    let response = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({ "email": "nobody@club.test", "password": "wrong-password" }),
        "198.51.100.77",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body = json_body(response).await;
    assert!(body["retry_after_seconds"].as_u64().unwrap() >= 1);

    // Windows are per client; another IP is unaffected
    let response = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({ "email": "nobody@club.test", "password": "wrong-password" }),
        "198.51.100.78",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rate_limit() {
    let (app, _db, _jwt) = create_test_app().await;

    for i in 0..3 {
        let response = send_json(
            &app,
            "POST",
            "/api/auth/register",
            json!({
                "name": "Member",
                "email": format!("member{}@club.test", i),
                "password": "password123",
            }),
            "198.51.100.80",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send_json(
        &app,
        "POST",
        "/api/auth/register",
        json!({
            "name": "Member",
            "email": "member3@club.test",
            "password": "password123",
        }),
        "198.51.100.80",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_forgot_password_rate_limit() {
    let (app, _db, _jwt) = create_test_app().await;

    for _ in 0..5 {
        let response = send_json(
            &app,
            "POST",
            "/api/auth/forgot-password",
            json!({ "email": "alice@club.test" }),
            "198.51.100.81",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let response = send_json(
        &app,
        "POST",
        "/api/auth/forgot-password",
        json!({ "email": "alice@club.test" }),
        "198.51.100.81",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limited_route_rejects_requests_without_client_ip() {
    let (app, _db, _jwt) = create_test_app().await;

    // The app is configured to read X-Forwarded-For; a request without the
    // header cannot be attributed to a client and is rejected outright.
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "a@club.test", "password": "password123" }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
