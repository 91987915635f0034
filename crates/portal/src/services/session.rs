//! Session accessor.
//!
//! Ties gateway credential sessions to the server-side session: sign-in and
//! sign-up store a reference, sign-out discards it, and `get_session` reads
//! it back. Tokens stay server-side.

use serde::Serialize;
use tower_sessions::Session;

use student_portal_core::{AccountId, AccountRole};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::gateway::IdentityGateway;
use crate::middleware::auth::{clear_current_account, set_current_account, signed_in};
use crate::models::{CurrentAccount, StoredSession, session_keys};
use crate::services::auth::{AuthError, AuthService, SignUpRequest, SignUpResult, SignedIn};

/// What the current session exposes to clients. Never carries tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub account_id: AccountId,
    pub email: String,
    pub full_name: String,
    pub role: AccountRole,
    /// Unix timestamp (seconds).
    pub expires_at: Option<i64>,
}

/// Outcome of [`SessionAccessor::sign_up`].
#[derive(Debug)]
pub enum SignUpFlow {
    /// Signed in; continue to course selection.
    SignedIn(CurrentAccount),
    /// Waiting for the user to confirm their email.
    ConfirmationPending { email: String },
}

/// Gateway sessions bound to one browser session.
pub struct SessionAccessor<'a> {
    gateway: &'a dyn IdentityGateway,
    session: &'a Session,
}

impl<'a> SessionAccessor<'a> {
    #[must_use]
    pub const fn new(gateway: &'a dyn IdentityGateway, session: &'a Session) -> Self {
        Self { gateway, session }
    }

    /// Sign in, route by role, and remember the session.
    ///
    /// The session id is rotated before anything is stored.
    ///
    /// # Errors
    ///
    /// Returns any `AuthError` from [`AuthService::sign_in`], or
    /// `AuthError::Session` if the session store fails (the gateway session
    /// is revoked in that case).
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let auth = AuthService::new(self.gateway);
        let signed_in = auth.sign_in(email, password).await?;

        let account = CurrentAccount {
            id: signed_in.account.id,
            email: signed_in.account.email.clone(),
            full_name: signed_in.account.full_name.clone(),
            role: signed_in.account.role,
        };
        let stored = StoredSession::from(signed_in.session.clone());

        if let Err(e) = self.remember(&account, &stored).await {
            auth.revoke(&stored.access_token).await;
            return Err(e);
        }

        Ok(signed_in)
    }

    /// Register a student and, if the gateway opened a session, remember it.
    ///
    /// # Errors
    ///
    /// Returns any `AuthError` from [`AuthService::sign_up`], or
    /// `AuthError::Session` if the session store fails.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpFlow, AuthError> {
        match AuthService::new(self.gateway).sign_up(request).await? {
            SignUpResult::SignedIn { account, session } => {
                let current = CurrentAccount {
                    id: account.id,
                    email: account.email,
                    full_name: account.full_name,
                    role: account.role,
                };
                self.remember(&current, &StoredSession::from(session))
                    .await?;
                Ok(SignUpFlow::SignedIn(current))
            }
            SignUpResult::ConfirmationPending { email } => Ok(SignUpFlow::ConfirmationPending {
                email: email.into_inner(),
            }),
        }
    }

    /// Sign out. Calling it without a session, or twice, is not an error.
    ///
    /// The gateway revoke is best effort; the local reference is always
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Some(stored) = self.previous_session().await {
            AuthService::new(self.gateway)
                .revoke(&stored.access_token)
                .await;
            tracing::info!(account_id = %stored.account_id, "Signed out");
        }

        clear_current_account(self.session).await?;
        self.session.flush().await?;
        clear_sentry_user();
        Ok(())
    }

    /// The current session, or `None` when signed out.
    ///
    /// The token is checked with the gateway; a session the gateway no
    /// longer honors is discarded locally and reported as `None`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Gateway` if the gateway cannot be reached, or
    /// `AuthError::Session` if the session store fails.
    pub async fn get_session(&self) -> Result<Option<SessionInfo>, AuthError> {
        let Some((account, stored)) = signed_in(self.session).await else {
            return Ok(None);
        };

        match self.gateway.get_user(&stored.access_token).await? {
            Some(user) if user.id == account.id => Ok(Some(SessionInfo {
                account_id: account.id,
                email: account.email.into_inner(),
                full_name: account.full_name,
                role: account.role,
                expires_at: stored.expires_at,
            })),
            _ => {
                tracing::info!(account_id = %account.id, "Gateway no longer honors session");
                clear_current_account(self.session).await?;
                Ok(None)
            }
        }
    }

    /// The gateway session reference currently held, expired or not.
    async fn previous_session(&self) -> Option<StoredSession> {
        self.session
            .get(session_keys::GATEWAY_SESSION)
            .await
            .ok()
            .flatten()
    }

    /// Store a new identity over whatever the browser session held.
    ///
    /// A previous account's gateway token is revoked and its data (including
    /// any course selection) removed before the id is cycled.
    async fn remember(
        &self,
        account: &CurrentAccount,
        stored: &StoredSession,
    ) -> Result<(), AuthError> {
        if let Some(previous) = self.previous_session().await {
            AuthService::new(self.gateway)
                .revoke(&previous.access_token)
                .await;
            tracing::info!(
                previous_account_id = %previous.account_id,
                account_id = %account.id,
                "Replacing signed-in session"
            );
        }
        clear_current_account(self.session).await?;

        // New identity, new session id
        self.session.cycle_id().await?;
        set_current_account(self.session, account, stored).await?;
        set_sentry_user(&account.id, Some(account.email.as_str()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::gateway::{GatewayOperation, InMemoryGateway};

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn seed_student(gateway: &InMemoryGateway) -> AccountId {
        let id = gateway.add_credential("student@example.edu", "secret1");
        gateway.insert_row(
            "users",
            json!({
                "id": id.to_string(),
                "email": "student@example.edu",
                "full_name": "Stu Dent",
                "role": "student",
            }),
        );
        id
    }

    #[tokio::test]
    async fn test_get_session_empty_when_signed_out() {
        let gateway = InMemoryGateway::new();
        let session = new_session();

        let info = SessionAccessor::new(&gateway, &session)
            .get_session()
            .await
            .unwrap();

        assert!(info.is_none());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_then_get_session() {
        let gateway = InMemoryGateway::new();
        let id = seed_student(&gateway);
        let session = new_session();
        let accessor = SessionAccessor::new(&gateway, &session);

        accessor
            .sign_in("student@example.edu", "secret1")
            .await
            .unwrap();
        let info = accessor.get_session().await.unwrap().unwrap();

        assert_eq!(info.account_id, id);
        assert_eq!(info.role, AccountRole::Student);
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("token"));
    }

    #[tokio::test]
    async fn test_sign_out_twice() {
        let gateway = InMemoryGateway::new();
        seed_student(&gateway);
        let session = new_session();
        let accessor = SessionAccessor::new(&gateway, &session);
        accessor
            .sign_in("student@example.edu", "secret1")
            .await
            .unwrap();

        accessor.sign_out().await.unwrap();
        accessor.sign_out().await.unwrap();

        assert_eq!(gateway.active_sessions(), 0);
        assert!(accessor.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_survives_revoke_failure() {
        let gateway = InMemoryGateway::new();
        seed_student(&gateway);
        let session = new_session();
        let accessor = SessionAccessor::new(&gateway, &session);
        accessor
            .sign_in("student@example.edu", "secret1")
            .await
            .unwrap();
        gateway.fail(GatewayOperation::SignOut);

        accessor.sign_out().await.unwrap();

        assert!(signed_in(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_get_session_drops_revoked_token() {
        let gateway = InMemoryGateway::new();
        seed_student(&gateway);
        let session = new_session();
        let accessor = SessionAccessor::new(&gateway, &session);
        let signed_in_result = accessor
            .sign_in("student@example.edu", "secret1")
            .await
            .unwrap();

        // Revoked elsewhere
        gateway
            .sign_out(&signed_in_result.session.access_token)
            .await
            .unwrap();

        assert!(accessor.get_session().await.unwrap().is_none());
        assert!(signed_in(&session).await.is_none());
    }

    #[tokio::test]
    async fn test_get_session_gateway_failure_is_an_error() {
        let gateway = InMemoryGateway::new();
        seed_student(&gateway);
        let session = new_session();
        let accessor = SessionAccessor::new(&gateway, &session);
        accessor
            .sign_in("student@example.edu", "secret1")
            .await
            .unwrap();
        gateway.fail(GatewayOperation::GetUser);

        assert!(matches!(
            accessor.get_session().await,
            Err(AuthError::Gateway(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_over_existing_session_revokes_and_clears() {
        let gateway = InMemoryGateway::new();
        seed_student(&gateway);
        let session = new_session();
        let accessor = SessionAccessor::new(&gateway, &session);
        let first = accessor
            .sign_in("student@example.edu", "secret1")
            .await
            .unwrap();
        session
            .insert(session_keys::COURSE_SELECTION, json!(["leftover"]))
            .await
            .unwrap();

        accessor
            .sign_in("student@example.edu", "secret1")
            .await
            .unwrap();

        assert_eq!(gateway.active_sessions(), 1);
        assert!(
            gateway
                .get_user(&first.session.access_token)
                .await
                .unwrap()
                .is_none()
        );
        let selection: Option<serde_json::Value> =
            session.get(session_keys::COURSE_SELECTION).await.unwrap();
        assert!(selection.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_stores_session() {
        let gateway = InMemoryGateway::new();
        let session = new_session();
        let accessor = SessionAccessor::new(&gateway, &session);

        let flow = accessor
            .sign_up(&SignUpRequest {
                full_name: "New Student".to_string(),
                email: "new@example.edu".to_string(),
                phone: None,
                password: "secret1".to_string(),
                confirm_password: "secret1".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(flow, SignUpFlow::SignedIn(_)));
        let (account, _) = signed_in(&session).await.unwrap();
        assert_eq!(account.role, AccountRole::Student);
    }
}
