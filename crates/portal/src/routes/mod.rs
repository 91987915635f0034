//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Landing page (links to student/admin login)
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (identity gateway)
//!
//! # Auth
//! GET  /login                   - Student login page
//! POST /login                   - Student login action (rate limited)
//! GET  /admin/login             - Admin login page
//! POST /admin/login             - Admin login action (rate limited)
//! POST /logout                  - Logout action
//! GET  /signup                  - Registration page
//! POST /signup                  - Registration action (rate limited)
//!
//! # Course selection (students)
//! GET  /signup/courses          - Selection screen
//! POST /signup/courses/toggle   - Pick or unpick a course
//! POST /signup/courses          - Submit the selection
//!
//! # Dashboards
//! GET  /dashboard               - Student dashboard
//! GET  /admin/dashboard         - Admin dashboard
//!
//! # JSON API
//! GET  /api/auth/session        - Current session or null
//! ```

pub mod api;
pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod health;
pub mod home;
pub mod signup;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::landing))
        .route("/login", get(auth::login_page))
        .route("/admin/login", get(auth::admin_login_page))
        .route("/logout", post(auth::logout))
        .route("/signup", get(signup::signup_page))
        .route(
            "/signup/courses",
            get(courses::show).post(courses::submit),
        )
        .route("/signup/courses/toggle", post(courses::toggle))
        .route("/dashboard", get(dashboard::student))
        .route("/admin/dashboard", get(dashboard::admin))
}

/// Create the credential-submitting routes router.
///
/// Kept separate so only these POSTs share the strict limiter.
pub fn credential_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/admin/login", post(auth::admin_login))
        .route("/signup", post(signup::signup))
        .route_layer(auth_rate_limiter())
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/session", get(api::session))
        .route_layer(api_rate_limiter())
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(page_routes())
        .merge(credential_routes())
        .nest("/api", api_routes())
}
