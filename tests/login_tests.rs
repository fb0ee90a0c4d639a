//! Tests for login, registration, and self-service password change.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_register_and_login() {
    let (app, _db, _jwt) = create_test_app().await;

    let (_uuid, token) =
        register_member(&app, "Alice", "alice@club.test", "password123", "203.0.113.1").await;

    // The registration token authenticates /me
    let response = send_get(&app, "/api/members/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["email"], "alice@club.test");
    assert_eq!(body["role"], "member");
    assert_eq!(body["status"], "active");

    // A fresh login returns a token and the subject
    let response = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({ "email": "alice@club.test", "password": "password123" }),
        "203.0.113.1",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["subject"]["name"], "Alice");
    assert_eq!(body["subject"]["role"], "member");
}

#[tokio::test]
async fn test_login_failures_share_one_shape() {
    let (app, _db, _jwt) = create_test_app().await;

    register_member(&app, "Alice", "alice@club.test", "password123", "203.0.113.2").await;

    // Wrong password for a known email
    let wrong_password = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({ "email": "alice@club.test", "password": "wrong-password" }),
        "203.0.113.2",
        None,
    )
    .await;

    // Unknown email entirely
    let unknown_email = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({ "email": "nobody@club.test", "password": "wrong-password" }),
        "203.0.113.2",
        None,
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    // Responses must not reveal whether the email exists
    let body1 = json_body(wrong_password).await;
    let body2 = json_body(unknown_email).await;
    assert_eq!(body1, body2);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let (app, _db, _jwt) = create_test_app().await;

    register_member(&app, "Alice", "alice@club.test", "password123", "203.0.113.3").await;

    let response = send_json(
        &app,
        "POST",
        "/api/auth/register",
        json!({ "name": "Impostor", "email": "Alice@club.test", "password": "password456" }),
        "203.0.113.4",
        None,
    )
    .await;

    // Email comparison is case-insensitive
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation() {
    let (app, _db, _jwt) = create_test_app().await;

    let cases = [
        json!({ "name": "", "email": "a@club.test", "password": "password123" }),
        json!({ "name": "Alice", "email": "not-an-email", "password": "password123" }),
        json!({ "name": "Alice", "email": "a@club.test", "password": "short" }),
    ];

    for (i, case) in cases.into_iter().enumerate() {
        let ip = format!("203.0.113.{}", 10 + i);
        let response = send_json(&app, "POST", "/api/auth/register", case, &ip, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_suspended_member_cannot_login() {
    let (app, db, _jwt) = create_test_app().await;

    let (uuid, _token) =
        register_member(&app, "Alice", "alice@club.test", "password123", "203.0.113.5").await;

    db.credentials()
        .set_status(&uuid, clubdesk::db::AccountStatus::Suspended)
        .await
        .unwrap();

    // Correct password, non-active account
    let response = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({ "email": "alice@club.test", "password": "password123" }),
        "203.0.113.5",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_password_change_flow() {
    let (app, _db, _jwt) = create_test_app().await;

    let (_uuid, token) =
        register_member(&app, "Alice", "alice@club.test", "password123", "203.0.113.6").await;

    // Wrong current password is rejected
    let response = send_json(
        &app,
        "PUT",
        "/api/members/me/password",
        json!({ "current_password": "wrong-password", "new_password": "new-password-456" }),
        "203.0.113.6",
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Correct current password succeeds
    let response = send_json(
        &app,
        "PUT",
        "/api/members/me/password",
        json!({ "current_password": "password123", "new_password": "new-password-456" }),
        "203.0.113.6",
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Old password no longer works, new one does
    let response = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({ "email": "alice@club.test", "password": "password123" }),
        "203.0.113.6",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({ "email": "alice@club.test", "password": "new-password-456" }),
        "203.0.113.6",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
