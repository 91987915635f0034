//! Session-related types.
//!
//! Types stored in the server-side session for authentication state.

use serde::{Deserialize, Serialize};

use student_portal_core::{AccountId, AccountRole, Email};

use crate::gateway::{AccessToken, GatewaySession};

/// Session-stored account identity.
///
/// Written after the role check succeeds, so an account in the session
/// always has a recognized role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAccount {
    pub id: AccountId,
    pub email: Email,
    pub full_name: String,
    pub role: AccountRole,
}

/// Reference to the gateway credential session.
///
/// Tokens never leave the server; `Debug` on [`AccessToken`] is redacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub account_id: AccountId,
    pub access_token: AccessToken,
    /// Unix timestamp (seconds).
    pub expires_at: Option<i64>,
}

impl StoredSession {
    /// Whether the gateway session has expired at `now` (Unix seconds).
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl From<GatewaySession> for StoredSession {
    fn from(session: GatewaySession) -> Self {
        Self {
            account_id: session.user.id,
            access_token: session.access_token,
            expires_at: session.expires_at,
        }
    }
}

/// Session keys.
pub mod session_keys {
    /// Key for the signed-in account.
    pub const CURRENT_ACCOUNT: &str = "current_account";

    /// Key for the gateway session reference.
    pub const GATEWAY_SESSION: &str = "gateway_session";

    /// Key for the in-progress course selection.
    pub const COURSE_SELECTION: &str = "course_selection";
}
