//! Authentication service.
//!
//! Password sign-in with role routing, and two-step sign-up (credential,
//! then profile) with a compensating rollback of the credential when the
//! profile cannot be written.

mod error;

pub use error::AuthError;

use student_portal_core::{AccountId, AccountRole, Email};

use crate::db::accounts::AccountRepository;
use crate::gateway::{AccessToken, GatewayError, GatewaySession, IdentityGateway, SignUpOutcome};
use crate::models::{Account, NewAccount};
use crate::services::routing::{Destination, RoleRouter};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Sign-up form input.
pub struct SignUpRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// Profile fields that passed validation.
struct ValidatedProfile {
    email: Email,
    full_name: String,
    phone: Option<String>,
}

/// A successful sign-in.
#[derive(Debug)]
pub struct SignedIn {
    pub account: Account,
    pub session: GatewaySession,
    pub destination: Destination,
}

/// A successful sign-up.
#[derive(Debug)]
pub enum SignUpResult {
    /// Credential confirmed immediately; the user is signed in.
    SignedIn {
        account: Account,
        session: GatewaySession,
    },
    /// The gateway sent a confirmation email; no session yet.
    ConfirmationPending { email: Email },
}

/// Authentication service.
pub struct AuthService<'a> {
    gateway: &'a dyn IdentityGateway,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(gateway: &'a dyn IdentityGateway) -> Self {
        Self { gateway }
    }

    // =========================================================================
    // Sign-in
    // =========================================================================

    /// Sign in with email and password, then route by role.
    ///
    /// If the role check fails the new gateway session is revoked before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Returns `AuthError::InvalidAccountType` if the account has no usable role.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email = Email::parse(email)?;

        let session = self
            .gateway
            .sign_in_with_password(email.as_str(), password)
            .await?;

        let routed = RoleRouter::new(self.gateway, Some(&session.access_token))
            .route(session.user.id)
            .await;

        match routed {
            Ok((account, destination)) => {
                tracing::info!(account_id = %account.id, role = %account.role, "Signed in");
                Ok(SignedIn {
                    account,
                    session,
                    destination,
                })
            }
            Err(e) => {
                self.revoke(&session.access_token).await;
                Err(e)
            }
        }
    }

    /// Revoke a gateway session, logging instead of failing.
    pub async fn revoke(&self, token: &AccessToken) {
        if let Err(e) = self.gateway.sign_out(token).await {
            tracing::warn!(error = %e, "Failed to revoke gateway session");
        }
    }

    // =========================================================================
    // Sign-up
    // =========================================================================

    /// Register a student: create the credential, then the profile row.
    ///
    /// # Errors
    ///
    /// Returns a validation error (`PasswordMismatch`, `WeakPassword`,
    /// `InvalidEmail`, `MissingFullName`) before any gateway call.
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    /// Returns `AuthError::Repository` if the profile insert fails; the
    /// credential is rolled back first.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResult, AuthError> {
        let profile = validate_sign_up(request)?;

        let outcome = self
            .gateway
            .sign_up(profile.email.as_str(), &request.password)
            .await?;

        let id = outcome.user().id;
        let token = match &outcome {
            SignUpOutcome::Session(session) => Some(&session.access_token),
            SignUpOutcome::ConfirmationRequired(_) => None,
        };

        let new_account = NewAccount::student(
            id,
            profile.email.clone(),
            profile.full_name.clone(),
            profile.phone.clone(),
        );
        if let Err(e) = AccountRepository::new(self.gateway, token)
            .create(&new_account)
            .await
        {
            tracing::error!(account_id = %id, error = %e, "Profile insert failed after sign-up");
            self.roll_back_credential(id, token).await;
            return Err(e.into());
        }

        tracing::info!(account_id = %id, "Student registered");

        Ok(match outcome {
            SignUpOutcome::Session(session) => SignUpResult::SignedIn {
                account: Account {
                    id,
                    email: profile.email,
                    full_name: profile.full_name,
                    phone: profile.phone,
                    role: AccountRole::Student,
                },
                session,
            },
            SignUpOutcome::ConfirmationRequired(_) => SignUpResult::ConfirmationPending {
                email: profile.email,
            },
        })
    }

    /// Undo a credential whose profile could not be written.
    async fn roll_back_credential(&self, id: AccountId, token: Option<&AccessToken>) {
        if let Some(token) = token {
            self.revoke(token).await;
        }

        match self.gateway.delete_user(id).await {
            Ok(()) => tracing::info!(account_id = %id, "Rolled back credential"),
            Err(GatewayError::NotConfigured(key)) => tracing::error!(
                account_id = %id,
                missing = key,
                "Credential left without a profile; rollback needs service-role access"
            ),
            Err(e) => tracing::error!(
                account_id = %id,
                error = %e,
                "Credential left without a profile; rollback failed"
            ),
        }
    }
}

/// Validate sign-up input without touching the gateway.
fn validate_sign_up(request: &SignUpRequest) -> Result<ValidatedProfile, AuthError> {
    if request.password != request.confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    validate_password(&request.password)?;

    let email = Email::parse(&request.email)?;

    let full_name = request.full_name.trim();
    if full_name.is_empty() {
        return Err(AuthError::MissingFullName);
    }

    let phone = request
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty())
        .map(String::from);

    Ok(ValidatedProfile {
        email,
        full_name: full_name.to_string(),
        phone,
    })
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}
