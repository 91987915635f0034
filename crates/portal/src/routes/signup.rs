//! Registration route handlers.
//!
//! Errors re-render the form inline with the non-secret fields kept.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::filters;
use crate::services::auth::{AuthError, SignUpRequest};
use crate::services::routing::Destination;
use crate::services::session::{SessionAccessor, SignUpFlow};
use crate::state::AppState;

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// Registration page template.
#[derive(Template, WebTemplate, Default)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub error: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

/// "Check your email" page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup_pending.html")]
pub struct SignupPendingTemplate {
    pub email: String,
}

/// Display the registration page.
pub async fn signup_page() -> impl IntoResponse {
    SignupTemplate::default()
}

/// Handle the registration form.
///
/// A signed-in result continues to course selection; a pending confirmation
/// shows the "check your email" page.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    let request = SignUpRequest {
        full_name: form.full_name.clone(),
        email: form.email.clone(),
        phone: form.phone.clone(),
        password: form.password,
        confirm_password: form.confirm_password,
    };

    match SessionAccessor::new(state.gateway(), &session)
        .sign_up(&request)
        .await
    {
        Ok(SignUpFlow::SignedIn(account)) => {
            tracing::info!(account_id = %account.id, "Student registered");
            Redirect::to(Destination::CourseSelection.path()).into_response()
        }
        Ok(SignUpFlow::ConfirmationPending { email }) => {
            tracing::info!("Student registered, awaiting email confirmation");
            SignupPendingTemplate { email }.into_response()
        }
        Err(e) => {
            let status = signup_error_status(&e);
            if status.is_server_error() {
                tracing::error!(error = %e, "Signup failed");
            } else {
                tracing::debug!(error = %e, "Signup rejected");
            }

            let template = SignupTemplate {
                error: Some(e.user_message()),
                full_name: form.full_name,
                email: form.email,
                phone: form.phone.unwrap_or_default(),
            };
            (status, template).into_response()
        }
    }
}

/// Status for a re-rendered signup form.
#[must_use]
pub const fn signup_error_status(error: &AuthError) -> StatusCode {
    match error {
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::Repository(_) | AuthError::Gateway(_) | AuthError::Session(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}
