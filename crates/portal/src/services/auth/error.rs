//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::gateway::GatewayError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] student_portal_core::EmailError),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Signed in, but the account has no recognized role.
    #[error("invalid account type")]
    InvalidAccountType,

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Full name left blank.
    #[error("full name is required")]
    MissingFullName,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Gateway error outside the credential checks above.
    #[error("gateway error: {0}")]
    Gateway(GatewayError),

    /// Server-side session could not be read or written.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AuthError {
    /// Whether the error was caught before any gateway call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail(_) | Self::PasswordMismatch | Self::WeakPassword(_) | Self::MissingFullName
        )
    }

    /// Message safe to show next to a form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
            Self::InvalidCredentials => "Invalid email or password.".to_string(),
            Self::InvalidAccountType => "Invalid account type".to_string(),
            Self::PasswordMismatch => "Passwords do not match".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::MissingFullName => "Please enter your full name.".to_string(),
            Self::UserAlreadyExists => "An account with this email already exists.".to_string(),
            Self::Repository(_) | Self::Gateway(_) | Self::Session(_) => {
                "Signup failed. Please try again.".to_string()
            }
        }
    }
}

impl From<GatewayError> for AuthError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::InvalidCredentials => Self::InvalidCredentials,
            GatewayError::AlreadyRegistered => Self::UserAlreadyExists,
            other => Self::Gateway(other),
        }
    }
}
