//! Integration tests for the student portal.
//!
//! Tests drive the full axum router in-process with
//! `tower::ServiceExt::oneshot`, backed by the in-memory identity gateway and
//! an in-memory session store. No database or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p student-portal-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_health() {
//!     let mut ctx = TestContext::new();
//!     let resp = ctx.get("/health").await;
//!     assert_eq!(resp.status, StatusCode::OK);
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use url::Url;

use student_portal::config::{GatewayConfig, PortalConfig};
use student_portal::gateway::InMemoryGateway;
use student_portal::middleware::session::SESSION_COOKIE_NAME;
use student_portal::state::AppState;
use student_portal_core::{AccountId, CourseId};

/// Portal configuration for tests. Nothing in it is contacted.
///
/// # Panics
///
/// Never in practice; the gateway URL is a constant.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_config() -> PortalConfig {
    PortalConfig {
        database_url: SecretString::from("postgres://localhost/portal_test"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        gateway: GatewayConfig {
            url: Url::parse("http://localhost:54321").unwrap(),
            anon_key: SecretString::from("test-anon-key"),
            service_role_key: None,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A response with its body read to a string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    /// The body parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// One browser talking to a fresh portal.
///
/// Carries the session cookie between requests like a browser would.
pub struct TestContext {
    pub gateway: Arc<InMemoryGateway>,
    app: Router,
    cookie: Option<String>,
    peer: SocketAddr,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Portal over a gateway that confirms sign-ups immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::with_gateway(InMemoryGateway::new())
    }

    /// Portal over the given gateway.
    #[must_use]
    pub fn with_gateway(gateway: InMemoryGateway) -> Self {
        let gateway = Arc::new(gateway);
        let state = AppState::new(test_config(), gateway.clone());
        let app = student_portal::app(state, MemoryStore::default());

        Self {
            gateway,
            app,
            cookie: None,
            peer: SocketAddr::from(([192, 0, 2, 1], 50_000)),
        }
    }

    /// Whether the browser currently holds a session cookie.
    #[must_use]
    pub const fn has_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    /// Forget the session cookie (a different browser).
    pub fn clear_cookies(&mut self) {
        self.cookie = None;
    }

    // =========================================================================
    // Requests
    // =========================================================================

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Request::get(path), Body::empty()).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let builder = Request::post(path).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        self.send(builder, Body::from(body)).await
    }

    #[allow(clippy::unwrap_used)]
    async fn send(&mut self, mut builder: axum::http::request::Builder, body: Body) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let mut request = builder.body(body).unwrap();
        request.extensions_mut().insert(ConnectInfo(self.peer));

        let response = self.app.clone().oneshot(request).await.unwrap();
        self.remember_cookie(response.headers());

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn remember_cookie(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let Some(pair) = value.split(';').next() else { continue };
            let Some((name, cookie_value)) = pair.split_once('=') else {
                continue;
            };
            if name.trim() != SESSION_COOKIE_NAME {
                continue;
            }

            let removed = cookie_value.is_empty() || value.contains("Max-Age=0");
            self.cookie = (!removed).then(|| pair.trim().to_string());
        }
    }

    // =========================================================================
    // Flows
    // =========================================================================

    /// Submit the student login form.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/login", &[("email", email), ("password", password)])
            .await
    }

    /// Submit the signup form with matching passwords and no phone.
    pub async fn sign_up(&mut self, full_name: &str, email: &str, password: &str) -> TestResponse {
        self.post_form(
            "/signup",
            &[
                ("full_name", full_name),
                ("email", email),
                ("phone", ""),
                ("password", password),
                ("confirm_password", password),
            ],
        )
        .await
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Credential plus profile. `role` of `None` leaves the role column null.
    pub fn seed_account(&self, email: &str, password: &str, role: Option<&str>) -> AccountId {
        let id = self.gateway.add_credential(email, password);
        self.gateway.insert_row(
            "users",
            json!({
                "id": id.to_string(),
                "email": email,
                "full_name": "Test Person",
                "phone": null,
                "role": role,
            }),
        );
        id
    }

    /// A course in the catalog.
    pub fn seed_course(&self, name: &str, price: i64, active: bool) -> CourseId {
        let id = CourseId::generate();
        self.gateway.insert_row(
            "courses",
            json!({
                "id": id.to_string(),
                "name": name,
                "description": format!("All about {name}"),
                "price": price,
                "duration_weeks": 8,
                "category": "General",
                "is_active": active,
            }),
        );
        id
    }
}
