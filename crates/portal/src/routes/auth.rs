//! Authentication route handlers.
//!
//! `/login` and `/admin/login` share one flow: the account's role, not the
//! page it signed in from, decides where it lands.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use student_portal_core::AccountRole;

use crate::filters;
use crate::middleware::OptionalAccount;
use crate::services::auth::AuthError;
use crate::services::routing::Destination;
use crate::services::session::SessionAccessor;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template (student and admin).
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub heading: &'static str,
    pub action: &'static str,
    pub error: Option<&'static str>,
    /// Students can register; admins cannot.
    pub show_signup: bool,
}

impl LoginTemplate {
    fn new(login: Destination, error: Option<&str>) -> Self {
        let is_admin = login == Destination::AdminLogin;
        Self {
            heading: if is_admin { "Admin sign in" } else { "Student sign in" },
            action: login.path(),
            error: error.map(login_error_message),
            show_signup: !is_admin,
        }
    }
}

// =============================================================================
// Error Codes
// =============================================================================

/// Query code for a failed sign-in.
#[must_use]
pub const fn login_error_code(error: &AuthError) -> &'static str {
    match error {
        AuthError::InvalidEmail(_) => "invalid_email",
        AuthError::InvalidCredentials => "credentials",
        AuthError::InvalidAccountType => "invalid_account_type",
        AuthError::Session(_) => "session",
        _ => "unavailable",
    }
}

/// Message for a login error code. Unknown codes get the generic message.
#[must_use]
pub fn login_error_message(code: &str) -> &'static str {
    match code {
        "invalid_email" => "Please enter a valid email address.",
        "credentials" => "Invalid email or password.",
        "invalid_account_type" => "Invalid account type",
        _ => "Something went wrong. Please try again.",
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the student login page.
pub async fn login_page(
    OptionalAccount(account): OptionalAccount,
    Query(query): Query<MessageQuery>,
) -> Response {
    show_login(Destination::StudentLogin, account.map(|a| a.role), query)
}

/// Display the admin login page.
pub async fn admin_login_page(
    OptionalAccount(account): OptionalAccount,
    Query(query): Query<MessageQuery>,
) -> Response {
    show_login(Destination::AdminLogin, account.map(|a| a.role), query)
}

fn show_login(
    login: Destination,
    signed_in_as: Option<AccountRole>,
    query: MessageQuery,
) -> Response {
    // Already signed in: straight to the dashboard
    if let Some(role) = signed_in_as {
        return Redirect::to(Destination::for_role(role).path()).into_response();
    }

    LoginTemplate::new(login, query.error.as_deref()).into_response()
}

/// Handle the student login form.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Redirect {
    sign_in(&state, &session, &form, Destination::StudentLogin).await
}

/// Handle the admin login form.
pub async fn admin_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Redirect {
    sign_in(&state, &session, &form, Destination::AdminLogin).await
}

async fn sign_in(
    state: &AppState,
    session: &Session,
    form: &LoginForm,
    login: Destination,
) -> Redirect {
    match SessionAccessor::new(state.gateway(), session)
        .sign_in(&form.email, &form.password)
        .await
    {
        Ok(signed_in) => Redirect::to(signed_in.destination.path()),
        Err(e) => {
            let code = login_error_code(&e);
            match &e {
                AuthError::Repository(_) | AuthError::Gateway(_) | AuthError::Session(_) => {
                    tracing::error!(error = %e, "Sign-in failed");
                }
                _ => tracing::warn!(error = %e, "Sign-in rejected"),
            }
            Redirect::to(&format!("{}?error={code}", login.path()))
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout. Always ends on the landing page.
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    if let Err(e) = SessionAccessor::new(state.gateway(), &session)
        .sign_out()
        .await
    {
        tracing::error!(error = %e, "Failed to clear session on logout");
    }

    Redirect::to(Destination::Landing.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;

    #[test]
    fn test_error_codes_round_trip_to_messages() {
        assert_eq!(
            login_error_message(login_error_code(&AuthError::InvalidAccountType)),
            "Invalid account type"
        );
        assert_eq!(
            login_error_message(login_error_code(&AuthError::InvalidCredentials)),
            "Invalid email or password."
        );
        assert_eq!(
            login_error_code(&AuthError::Gateway(GatewayError::NotConfigured("x"))),
            "unavailable"
        );
    }

    #[test]
    fn test_unknown_code_gets_generic_message() {
        assert_eq!(
            login_error_message("<script>"),
            "Something went wrong. Please try again."
        );
    }

    #[test]
    fn test_admin_login_hides_signup() {
        let admin = LoginTemplate::new(Destination::AdminLogin, None);
        assert!(!admin.show_signup);
        assert_eq!(admin.action, "/admin/login");

        let student = LoginTemplate::new(Destination::StudentLogin, Some("credentials"));
        assert!(student.show_signup);
        assert_eq!(student.error, Some("Invalid email or password."));
    }
}
