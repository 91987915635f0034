//! Sign-in, sign-up, sign-out and role enforcement through the full router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::Value;

use student_portal::gateway::{GatewayOperation, InMemoryGateway};
use student_portal_integration_tests::TestContext;

#[tokio::test]
async fn test_student_sign_in_lands_on_dashboard() {
    let mut ctx = TestContext::new();
    ctx.seed_account("student@example.edu", "secret1", Some("student"));

    let resp = ctx.sign_in("student@example.edu", "secret1").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/dashboard"));

    let dashboard = ctx.get("/dashboard").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert!(dashboard.body.contains("Welcome, Test Person"));
}

#[tokio::test]
async fn test_admin_routes_by_role_from_either_login_page() {
    let mut ctx = TestContext::new();
    ctx.seed_account("admin@example.edu", "secret1", Some("admin"));

    // The student page still sends an admin to the admin dashboard
    let resp = ctx.sign_in("admin@example.edu", "secret1").await;
    assert_eq!(resp.location(), Some("/admin/dashboard"));

    ctx.clear_cookies();
    let resp = ctx
        .post_form(
            "/admin/login",
            &[("email", "admin@example.edu"), ("password", "secret1")],
        )
        .await;
    assert_eq!(resp.location(), Some("/admin/dashboard"));

    let dashboard = ctx.get("/admin/dashboard").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert!(dashboard.body.contains("Admin dashboard"));
}

#[tokio::test]
async fn test_missing_role_signs_out_and_shows_error() {
    let mut ctx = TestContext::new();
    ctx.seed_account("nobody@example.edu", "secret1", None);

    let resp = ctx.sign_in("nobody@example.edu", "secret1").await;
    assert_eq!(resp.location(), Some("/login?error=invalid_account_type"));
    assert_eq!(ctx.gateway.active_sessions(), 0);

    let page = ctx.get("/login?error=invalid_account_type").await;
    assert!(page.body.contains("Invalid account type"));

    let session = ctx.get("/api/auth/session").await;
    assert_eq!(session.json()["session"], Value::Null);
}

#[tokio::test]
async fn test_unknown_role_is_rejected_like_missing_role() {
    let mut ctx = TestContext::new();
    ctx.seed_account("instructor@example.edu", "secret1", Some("instructor"));

    let resp = ctx
        .post_form(
            "/admin/login",
            &[("email", "instructor@example.edu"), ("password", "secret1")],
        )
        .await;

    assert_eq!(
        resp.location(),
        Some("/admin/login?error=invalid_account_type")
    );
    assert_eq!(ctx.gateway.active_sessions(), 0);
}

#[tokio::test]
async fn test_wrong_password() {
    let mut ctx = TestContext::new();
    ctx.seed_account("student@example.edu", "secret1", Some("student"));

    let resp = ctx.sign_in("student@example.edu", "wrong-password").await;
    assert_eq!(resp.location(), Some("/login?error=credentials"));

    let page = ctx.get("/login?error=credentials").await;
    assert!(page.body.contains("Invalid email or password."));
}

#[tokio::test]
async fn test_dashboards_enforce_roles() {
    let mut ctx = TestContext::new();

    // Anonymous: sent to the matching login page
    assert_eq!(ctx.get("/dashboard").await.location(), Some("/login"));
    assert_eq!(
        ctx.get("/admin/dashboard").await.location(),
        Some("/admin/login")
    );
    assert_eq!(ctx.get("/signup/courses").await.location(), Some("/login"));

    // Wrong role: forbidden
    ctx.seed_account("student@example.edu", "secret1", Some("student"));
    ctx.sign_in("student@example.edu", "secret1").await;
    assert_eq!(
        ctx.get("/admin/dashboard").await.status,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_signed_in_visitor_skips_login_page() {
    let mut ctx = TestContext::new();
    ctx.seed_account("student@example.edu", "secret1", Some("student"));
    ctx.sign_in("student@example.edu", "secret1").await;

    assert_eq!(ctx.get("/login").await.location(), Some("/dashboard"));
    let landing = ctx.get("/").await;
    assert!(landing.body.contains("Go to your dashboard"));
}

#[tokio::test]
async fn test_sign_out_twice() {
    let mut ctx = TestContext::new();
    ctx.seed_account("student@example.edu", "secret1", Some("student"));
    ctx.sign_in("student@example.edu", "secret1").await;

    let first = ctx.post_form("/logout", &[]).await;
    assert_eq!(first.location(), Some("/"));
    let second = ctx.post_form("/logout", &[]).await;
    assert_eq!(second.location(), Some("/"));

    assert_eq!(ctx.gateway.active_sessions(), 0);
    assert_eq!(ctx.get("/dashboard").await.location(), Some("/login"));
}

#[tokio::test]
async fn test_session_api() {
    let mut ctx = TestContext::new();
    let id = ctx.seed_account("student@example.edu", "secret1", Some("student"));

    let anonymous = ctx.get("/api/auth/session").await;
    assert_eq!(anonymous.status, StatusCode::OK);
    assert_eq!(anonymous.json(), serde_json::json!({ "session": null }));

    ctx.sign_in("student@example.edu", "secret1").await;
    let resp = ctx.get("/api/auth/session").await;
    let session = &resp.json()["session"];

    assert_eq!(session["account_id"], id.to_string());
    assert_eq!(session["role"], "student");
    assert!(!resp.body.contains("token"));
}

#[tokio::test]
async fn test_session_api_reports_gateway_failure() {
    let mut ctx = TestContext::new();
    ctx.seed_account("student@example.edu", "secret1", Some("student"));
    ctx.sign_in("student@example.edu", "secret1").await;
    ctx.gateway.fail(GatewayOperation::GetUser);

    let resp = ctx.get("/api/auth/session").await;

    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.json()["error"].is_string());
}

// =============================================================================
// Sign-up
// =============================================================================

#[tokio::test]
async fn test_sign_up_continues_to_course_selection() {
    let mut ctx = TestContext::new();

    let resp = ctx
        .sign_up("New Student", "new@example.edu", "secret1")
        .await;
    assert_eq!(resp.location(), Some("/signup/courses"));

    let profiles = ctx.gateway.rows("users");
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["role"], "student");
    assert_eq!(profiles[0]["full_name"], "New Student");
    assert_eq!(profiles[0]["phone"], Value::Null);

    let screen = ctx.get("/signup/courses").await;
    assert_eq!(screen.status, StatusCode::OK);
}

#[tokio::test]
async fn test_sign_up_validation_happens_before_gateway() {
    let mut ctx = TestContext::new();

    let mismatch = ctx
        .post_form(
            "/signup",
            &[
                ("full_name", "Ada"),
                ("email", "ada@example.edu"),
                ("phone", "555-0100"),
                ("password", "secret1"),
                ("confirm_password", "secret2"),
            ],
        )
        .await;
    assert_eq!(mismatch.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(mismatch.body.contains("Passwords do not match"));
    // Non-secret fields are kept
    assert!(mismatch.body.contains("value=\"ada@example.edu\""));
    assert!(mismatch.body.contains("value=\"555-0100\""));

    let short = ctx.sign_up("Ada", "ada@example.edu", "abc").await;
    assert_eq!(short.status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(ctx.gateway.calls().is_empty());
}

#[tokio::test]
async fn test_sign_up_pending_confirmation() {
    let mut ctx = TestContext::with_gateway(InMemoryGateway::requiring_confirmation());

    let resp = ctx
        .sign_up("New Student", "new@example.edu", "secret1")
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Check your email"));
    assert!(resp.body.contains("new@example.edu"));
    assert_eq!(ctx.gateway.active_sessions(), 0);
}

#[tokio::test]
async fn test_failed_profile_insert_rolls_back_credential() {
    let mut ctx = TestContext::new();
    ctx.gateway.fail(GatewayOperation::Insert);

    let resp = ctx
        .sign_up("New Student", "new@example.edu", "secret1")
        .await;

    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert!(resp.body.contains("Signup failed. Please try again."));
    assert!(!ctx.gateway.has_credential("new@example.edu"));
    assert_eq!(ctx.gateway.call_count(GatewayOperation::DeleteUser), 1);
}

#[tokio::test]
async fn test_duplicate_email() {
    let mut ctx = TestContext::new();
    ctx.seed_account("taken@example.edu", "secret1", Some("student"));

    let resp = ctx.sign_up("Someone", "taken@example.edu", "secret1").await;

    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert!(resp.body.contains("already exists"));
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_login_attempts_are_rate_limited() {
    let mut ctx = TestContext::new();

    for _ in 0..5 {
        let resp = ctx.sign_in("someone@example.edu", "guess").await;
        assert_eq!(resp.status, StatusCode::SEE_OTHER);
    }

    let resp = ctx.sign_in("someone@example.edu", "guess").await;
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);

    // Pages are not limited
    assert_eq!(ctx.get("/login").await.status, StatusCode::OK);
}
