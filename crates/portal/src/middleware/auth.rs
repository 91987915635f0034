//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in account, optionally with a
//! specific role, in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use student_portal_core::AccountRole;

use crate::gateway::AccessToken;
use crate::models::{CurrentAccount, StoredSession, session_keys};
use crate::services::routing::Destination;

/// Error returned when a signed-in account (with the right role) is required.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to a login page (for HTML requests).
    RedirectToLogin(Destination),
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in, but with a role that may not see this page.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(login) => Redirect::to(login.path()).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Your account does not have access to this page",
            )
                .into_response(),
        }
    }
}

/// Read the signed-in account and gateway session reference.
///
/// Returns `None` if either is missing or the gateway session has expired.
pub async fn signed_in(session: &Session) -> Option<(CurrentAccount, StoredSession)> {
    let account: CurrentAccount = session
        .get(session_keys::CURRENT_ACCOUNT)
        .await
        .ok()
        .flatten()?;
    let stored: StoredSession = session
        .get(session_keys::GATEWAY_SESSION)
        .await
        .ok()
        .flatten()?;

    if stored.is_expired_at(chrono::Utc::now().timestamp()) || stored.account_id != account.id {
        return None;
    }

    Some((account, stored))
}

/// Access token of the signed-in account, if any.
pub async fn access_token(session: &Session) -> Option<AccessToken> {
    signed_in(session).await.map(|(_, stored)| stored.access_token)
}

async fn require_role(parts: &Parts, role: AccountRole) -> Result<CurrentAccount, AuthRejection> {
    let not_signed_in = || {
        if parts.uri.path().starts_with("/api/") {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin(Destination::login_for(role))
        }
    };

    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    let (account, _) = signed_in(session).await.ok_or_else(not_signed_in)?;

    if account.role != role {
        tracing::warn!(
            account_id = %account.id,
            role = %account.role,
            required = %role,
            path = parts.uri.path(),
            "Role not allowed"
        );
        return Err(AuthRejection::Forbidden);
    }

    Ok(account)
}

/// Extractor that requires a signed-in student.
///
/// Anonymous requests are sent to `/login`; other roles get 403.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireStudent(account): RequireStudent,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", account.full_name)
/// }
/// ```
pub struct RequireStudent(pub CurrentAccount);

impl<S> FromRequestParts<S> for RequireStudent
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, AccountRole::Student)
            .await
            .map(Self)
    }
}

/// Extractor that requires a signed-in admin.
///
/// Anonymous requests are sent to `/admin/login`; other roles get 403.
pub struct RequireAdmin(pub CurrentAccount);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, AccountRole::Admin)
            .await
            .map(Self)
    }
}

/// Extractor that optionally gets the signed-in account.
///
/// Unlike the role extractors, this does not reject anonymous requests.
pub struct OptionalAccount(pub Option<CurrentAccount>);

impl<S> FromRequestParts<S> for OptionalAccount
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account = match parts.extensions.get::<Session>() {
            Some(session) => signed_in(session).await.map(|(account, _)| account),
            None => None,
        };

        Ok(Self(account))
    }
}

/// Helper to store the signed-in account and its gateway session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_account(
    session: &Session,
    account: &CurrentAccount,
    gateway_session: &StoredSession,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CURRENT_ACCOUNT, account)
        .await?;
    session
        .insert(session_keys::GATEWAY_SESSION, gateway_session)
        .await
}

/// Helper to clear everything tied to the signed-in account (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_account(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAccount>(session_keys::CURRENT_ACCOUNT)
        .await?;
    session
        .remove::<StoredSession>(session_keys::GATEWAY_SESSION)
        .await?;
    session
        .remove::<serde_json::Value>(session_keys::COURSE_SELECTION)
        .await?;
    Ok(())
}
