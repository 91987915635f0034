//! Course selection and enrollment submission through the full router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use student_portal::gateway::GatewayOperation;
use student_portal_core::CourseId;
use student_portal_integration_tests::TestContext;

async fn signed_in_student() -> TestContext {
    let mut ctx = TestContext::new();
    ctx.seed_account("student@example.edu", "secret1", Some("student"));
    ctx.sign_in("student@example.edu", "secret1").await;
    ctx
}

async fn toggle(ctx: &mut TestContext, course: CourseId) {
    let id = course.to_string();
    let resp = ctx
        .post_form("/signup/courses/toggle", &[("course_id", id.as_str())])
        .await;
    assert_eq!(resp.location(), Some("/signup/courses"));
}

#[tokio::test]
async fn test_total_follows_selection() {
    let mut ctx = signed_in_student().await;
    let a = ctx.seed_course("Algebra", 100, true);
    let b = ctx.seed_course("Biology", 250, true);

    toggle(&mut ctx, a).await;
    toggle(&mut ctx, b).await;
    let screen = ctx.get("/signup/courses").await;
    assert!(screen.body.contains("Total: $350"));
    assert!(screen.body.contains("2 courses selected"));

    toggle(&mut ctx, a).await;
    let screen = ctx.get("/signup/courses").await;
    assert!(screen.body.contains("Total: $250"));
    assert!(screen.body.contains("1 course selected"));
}

#[tokio::test]
async fn test_empty_selection_never_reaches_gateway() {
    let mut ctx = signed_in_student().await;
    ctx.seed_course("Algebra", 100, true);

    let before = ctx.gateway.calls();

    let resp = ctx.post_form("/signup/courses", &[]).await;

    assert_eq!(resp.location(), Some("/signup/courses?error=empty"));
    assert_eq!(ctx.gateway.calls(), before);

    let screen = ctx.get("/signup/courses?error=empty").await;
    assert_eq!(screen.status, StatusCode::OK);
    assert!(screen.body.contains("Please select at least one course."));
    assert!(screen.body.contains("Algebra"));
    assert_eq!(ctx.gateway.call_count(GatewayOperation::Insert), 0);
}

#[tokio::test]
async fn test_empty_selection_message_needs_empty_selection() {
    let mut ctx = signed_in_student().await;
    let a = ctx.seed_course("Algebra", 100, true);
    toggle(&mut ctx, a).await;

    let screen = ctx.get("/signup/courses?error=empty").await;
    assert!(!screen.body.contains("Please select at least one course."));
    assert!(screen.body.contains("Total: $100"));
}

#[tokio::test]
async fn test_new_sign_in_starts_from_a_clean_session() {
    let mut ctx = TestContext::new();
    ctx.seed_account("first@example.edu", "secret1", Some("student"));
    ctx.seed_account("second@example.edu", "secret1", Some("student"));
    let a = ctx.seed_course("Algebra", 100, true);

    ctx.sign_in("first@example.edu", "secret1").await;
    toggle(&mut ctx, a).await;
    assert_eq!(ctx.gateway.active_sessions(), 1);

    // Same browser, different student
    ctx.sign_in("second@example.edu", "secret1").await;
    assert_eq!(ctx.gateway.active_sessions(), 1);

    let screen = ctx.get("/signup/courses").await;
    assert!(screen.body.contains("Total: $0"));

    let resp = ctx.post_form("/signup/courses", &[]).await;
    assert_eq!(resp.location(), Some("/signup/courses?error=empty"));
    assert!(ctx.gateway.rows("enrollments").is_empty());
}

#[tokio::test]
async fn test_successful_enrollment() {
    let mut ctx = signed_in_student().await;
    let a = ctx.seed_course("Algebra", 100, true);
    let b = ctx.seed_course("Biology", 250, true);
    toggle(&mut ctx, a).await;
    toggle(&mut ctx, b).await;

    let resp = ctx.post_form("/signup/courses", &[]).await;
    assert_eq!(resp.location(), Some("/dashboard"));

    let rows = ctx.gateway.rows("enrollments");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["status"] == "active"));
    assert_eq!(ctx.gateway.call_count(GatewayOperation::Insert), 1);

    let dashboard = ctx.get("/dashboard").await;
    assert!(dashboard.body.contains("Algebra"));
    assert!(dashboard.body.contains("Biology"));

    // Selection cleared
    let screen = ctx.get("/signup/courses").await;
    assert!(screen.body.contains("Total: $0"));
}

#[tokio::test]
async fn test_failed_enrollment_keeps_selection() {
    let mut ctx = signed_in_student().await;
    let a = ctx.seed_course("Algebra", 100, true);
    toggle(&mut ctx, a).await;
    ctx.gateway.fail(GatewayOperation::Insert);

    let resp = ctx.post_form("/signup/courses", &[]).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Enrollment failed. Please try again."));
    assert!(resp.body.contains("Total: $100"));

    // Retry once the gateway is back
    ctx.gateway.recover(GatewayOperation::Insert);
    let retry = ctx.post_form("/signup/courses", &[]).await;
    assert_eq!(retry.location(), Some("/dashboard"));
    assert_eq!(ctx.gateway.rows("enrollments").len(), 1);
}

#[tokio::test]
async fn test_retired_course_drops_out_of_selection() {
    let mut ctx = signed_in_student().await;
    let a = ctx.seed_course("Algebra", 100, true);
    let retired = CourseId::generate();
    ctx.seed_course("Zoology", 400, true);

    toggle(&mut ctx, a).await;
    toggle(&mut ctx, retired).await;

    let screen = ctx.get("/signup/courses").await;
    assert!(screen.body.contains("Total: $100"));
    assert!(screen.body.contains("1 course selected"));
}

#[tokio::test]
async fn test_admin_cannot_use_course_selection() {
    let mut ctx = TestContext::new();
    ctx.seed_account("admin@example.edu", "secret1", Some("admin"));
    ctx.sign_in("admin@example.edu", "secret1").await;

    assert_eq!(
        ctx.get("/signup/courses").await.status,
        StatusCode::FORBIDDEN
    );
}
