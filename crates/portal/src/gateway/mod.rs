//! Identity gateway: hosted credential and table storage.
//!
//! # Architecture
//!
//! - The gateway owns every durable record: credentials, credential sessions,
//!   and the `users`, `courses` and `enrollments` tables
//! - Handlers never talk to it directly; they go through the services and
//!   repositories, which take an `&dyn IdentityGateway`
//! - [`SupabaseClient`] is the production implementation (GoTrue auth API +
//!   PostgREST table API over `reqwest`)
//! - [`InMemoryGateway`] implements the same capability set in process, for
//!   tests and local development without a hosted project
//!
//! # Example
//!
//! ```rust,ignore
//! use student_portal::gateway::{IdentityGateway, SelectQuery};
//!
//! let session = gateway.sign_in_with_password("ada@example.edu", "hunter22").await?;
//! let rows = gateway
//!     .select(
//!         &SelectQuery::from("users").eq("id", session.user.id).single(),
//!         Some(&session.access_token),
//!     )
//!     .await?;
//! ```

mod client;
mod memory;
mod query;

pub use client::SupabaseClient;
pub use memory::{GatewayOperation, InMemoryGateway};
pub use query::SelectQuery;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use student_portal_core::AccountId;

/// Errors that can occur when talking to the identity gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("gateway returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Email/password pair was rejected.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// A credential with this email already exists.
    #[error("user already registered")]
    AlreadyRegistered,

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The operation needs configuration that is not present.
    #[error("not configured: {0}")]
    NotConfigured(&'static str),
}

/// Bearer token issued by the gateway.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the raw token for an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// The credential record the gateway embeds in sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayUser {
    pub id: AccountId,
    #[serde(default)]
    pub email: Option<String>,
}

/// A credential session issued by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySession {
    pub access_token: AccessToken,
    /// Expiry as a Unix timestamp (seconds).
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: GatewayUser,
}

/// Result of creating a credential.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The gateway auto-confirmed the credential and opened a session.
    Session(GatewaySession),
    /// The credential exists but the email must be confirmed before sign-in.
    ConfirmationRequired(GatewayUser),
}

impl SignUpOutcome {
    /// The created credential, regardless of confirmation state.
    #[must_use]
    pub const fn user(&self) -> &GatewayUser {
        match self {
            Self::Session(session) => &session.user,
            Self::ConfirmationRequired(user) => user,
        }
    }
}

/// Capability set of the hosted identity and storage service.
///
/// Table operations take the caller's access token when signed in; without
/// one the request is made with the anon key.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Exchange an email/password pair for a session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidCredentials` if the pair is rejected.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<GatewaySession, GatewayError>;

    /// Create a credential.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::AlreadyRegistered` if the email is taken.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, GatewayError>;

    /// Revoke a session. Revoking an unknown or expired token succeeds.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the gateway cannot be reached.
    async fn sign_out(&self, token: &AccessToken) -> Result<(), GatewayError>;

    /// Resolve the credential behind a token, or `None` if the token is no
    /// longer valid.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the gateway cannot be reached.
    async fn get_user(&self, token: &AccessToken) -> Result<Option<GatewayUser>, GatewayError>;

    /// Read rows from a table. A `single()` query yields at most one row.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the request fails.
    async fn select(
        &self,
        query: &SelectQuery,
        token: Option<&AccessToken>,
    ) -> Result<Vec<serde_json::Value>, GatewayError>;

    /// Insert rows into a table as one batch.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the batch is rejected.
    async fn insert(
        &self,
        table: &str,
        rows: Vec<serde_json::Value>,
        token: Option<&AccessToken>,
    ) -> Result<(), GatewayError>;

    /// Delete a credential. Requires service-role access.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotConfigured` without service-role access.
    async fn delete_user(&self, id: AccountId) -> Result<(), GatewayError>;

    /// Readiness probe.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the gateway is unreachable or unhealthy.
    async fn health(&self) -> Result<(), GatewayError>;
}
