//! In-process gateway.
//!
//! Holds credentials, sessions and tables in memory behind a mutex. Used by
//! the test suites and for running the portal without a hosted project.
//! Individual operations can be made to fail, and every call is recorded, so
//! tests can assert both outcomes and which calls were (not) made.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use student_portal_core::AccountId;

use super::{
    AccessToken, GatewayError, GatewaySession, GatewayUser, IdentityGateway, SelectQuery,
    SignUpOutcome,
};

/// Session lifetime handed out by the in-memory gateway (one hour).
const SESSION_TTL_SECONDS: i64 = 60 * 60;

/// Gateway operations, for failure injection and call tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    SignIn,
    SignUp,
    SignOut,
    GetUser,
    Select,
    Insert,
    DeleteUser,
    Health,
}

struct Credential {
    id: AccountId,
    email: String,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct MemoryState {
    /// Keyed by lowercased email.
    credentials: HashMap<String, Credential>,
    /// Access token to account.
    sessions: HashMap<String, AccountId>,
    tables: HashMap<String, Vec<Value>>,
    failing: HashSet<GatewayOperation>,
    calls: Vec<GatewayOperation>,
}

/// In-memory [`IdentityGateway`].
pub struct InMemoryGateway {
    state: Mutex<MemoryState>,
    auto_confirm: bool,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    /// A gateway that confirms new credentials immediately, so sign-up
    /// returns a session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            auto_confirm: true,
        }
    }

    /// A gateway that requires email confirmation, so sign-up returns no
    /// session and unconfirmed credentials cannot sign in.
    #[must_use]
    pub fn requiring_confirmation() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            auto_confirm: false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call and fail it if failure was injected for `operation`.
    fn enter(&self, operation: GatewayOperation) -> Result<MutexGuard<'_, MemoryState>, GatewayError> {
        let mut state = self.lock();
        state.calls.push(operation);
        if state.failing.contains(&operation) {
            return Err(GatewayError::Api {
                status: 503,
                message: format!("{operation:?} unavailable"),
            });
        }
        Ok(state)
    }

    // =========================================================================
    // Seeding and Inspection
    // =========================================================================

    /// Register a confirmed credential and return its id.
    pub fn add_credential(&self, email: &str, password: &str) -> AccountId {
        let id = AccountId::generate();
        self.lock().credentials.insert(
            email.to_lowercase(),
            Credential {
                id,
                email: email.to_string(),
                password: password.to_string(),
                confirmed: true,
            },
        );
        id
    }

    /// Append a row to a table without going through `insert`.
    pub fn insert_row(&self, table: &str, row: Value) {
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Snapshot of a table's rows.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Make every subsequent call of `operation` fail.
    pub fn fail(&self, operation: GatewayOperation) {
        self.lock().failing.insert(operation);
    }

    /// Undo [`fail`](Self::fail).
    pub fn recover(&self, operation: GatewayOperation) {
        self.lock().failing.remove(&operation);
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GatewayOperation> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn call_count(&self, operation: GatewayOperation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| **call == operation)
            .count()
    }

    #[must_use]
    pub fn has_credential(&self, email: &str) -> bool {
        self.lock().credentials.contains_key(&email.to_lowercase())
    }

    /// Number of sessions not yet signed out.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.lock().sessions.len()
    }
}

/// Issue a fresh session for `credential`.
fn open_session(state: &mut MemoryState, id: AccountId, email: &str) -> GatewaySession {
    let access_token = Uuid::new_v4().to_string();
    state.sessions.insert(access_token.clone(), id);

    GatewaySession {
        access_token: AccessToken::new(access_token),
        expires_at: Some(chrono::Utc::now().timestamp() + SESSION_TTL_SECONDS),
        user: GatewayUser {
            id,
            email: Some(email.to_string()),
        },
    }
}

/// Text form of a column value, as it appears in an `eq.` filter.
fn filter_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn compare_column(a: &Value, b: &Value, column: &str) -> Ordering {
    match (a.get(column), b.get(column)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (x, y) => filter_text(x).cmp(&filter_text(y)),
    }
}

#[async_trait]
impl IdentityGateway for InMemoryGateway {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<GatewaySession, GatewayError> {
        let mut state = self.enter(GatewayOperation::SignIn)?;

        let (id, stored_email) = match state.credentials.get(&email.to_lowercase()) {
            Some(credential) if credential.confirmed && credential.password == password => {
                (credential.id, credential.email.clone())
            }
            _ => return Err(GatewayError::InvalidCredentials),
        };

        Ok(open_session(&mut state, id, &stored_email))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, GatewayError> {
        let mut state = self.enter(GatewayOperation::SignUp)?;

        let key = email.to_lowercase();
        if state.credentials.contains_key(&key) {
            return Err(GatewayError::AlreadyRegistered);
        }

        let id = AccountId::generate();
        state.credentials.insert(
            key,
            Credential {
                id,
                email: email.to_string(),
                password: password.to_string(),
                confirmed: self.auto_confirm,
            },
        );

        if self.auto_confirm {
            Ok(SignUpOutcome::Session(open_session(&mut state, id, email)))
        } else {
            Ok(SignUpOutcome::ConfirmationRequired(GatewayUser {
                id,
                email: Some(email.to_string()),
            }))
        }
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), GatewayError> {
        let mut state = self.enter(GatewayOperation::SignOut)?;
        state.sessions.remove(token.expose());
        Ok(())
    }

    async fn get_user(&self, token: &AccessToken) -> Result<Option<GatewayUser>, GatewayError> {
        let state = self.enter(GatewayOperation::GetUser)?;

        let Some(id) = state.sessions.get(token.expose()).copied() else {
            return Ok(None);
        };
        let email = state
            .credentials
            .values()
            .find(|credential| credential.id == id)
            .map(|credential| credential.email.clone());

        Ok(Some(GatewayUser { id, email }))
    }

    async fn select(
        &self,
        query: &SelectQuery,
        _token: Option<&AccessToken>,
    ) -> Result<Vec<Value>, GatewayError> {
        let state = self.enter(GatewayOperation::Select)?;

        let mut rows: Vec<Value> = state
            .tables
            .get(query.table())
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .filters()
                            .iter()
                            .all(|(column, value)| filter_text(row.get(column)) == *value)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(column) = query.order_column() {
            rows.sort_by(|a, b| compare_column(a, b, column));
        }
        if query.is_single() {
            rows.truncate(1);
        }

        Ok(rows)
    }

    async fn insert(
        &self,
        table: &str,
        rows: Vec<Value>,
        _token: Option<&AccessToken>,
    ) -> Result<(), GatewayError> {
        let mut state = self.enter(GatewayOperation::Insert)?;

        let existing = state.tables.entry(table.to_string()).or_default();

        // Primary key check: the whole batch is rejected on any duplicate id
        let duplicate = rows.iter().filter_map(|row| row.get("id")).find(|id| {
            existing
                .iter()
                .any(|present| present.get("id") == Some(*id))
        });
        if let Some(id) = duplicate {
            return Err(GatewayError::Api {
                status: 409,
                message: format!("duplicate key value violates unique constraint ({id})"),
            });
        }

        existing.extend(rows);
        Ok(())
    }

    async fn delete_user(&self, id: AccountId) -> Result<(), GatewayError> {
        let mut state = self.enter(GatewayOperation::DeleteUser)?;

        state.credentials.retain(|_, credential| credential.id != id);
        state.sessions.retain(|_, account| *account != id);
        Ok(())
    }

    async fn health(&self) -> Result<(), GatewayError> {
        drop(self.enter(GatewayOperation::Health)?);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let gateway = InMemoryGateway::new();
        let id = gateway.add_credential("Ada@Example.edu", "hunter22");

        let session = gateway
            .sign_in_with_password("ada@example.edu", "hunter22")
            .await
            .unwrap();
        assert_eq!(session.user.id, id);
        assert_eq!(gateway.active_sessions(), 1);

        let wrong = gateway
            .sign_in_with_password("ada@example.edu", "nope")
            .await;
        assert!(matches!(wrong, Err(GatewayError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_up_without_auto_confirm_returns_no_session() {
        let gateway = InMemoryGateway::requiring_confirmation();

        let outcome = gateway.sign_up("new@example.edu", "secret1").await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));

        // Unconfirmed credentials cannot sign in
        let result = gateway
            .sign_in_with_password("new@example.edu", "secret1")
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicate_email() {
        let gateway = InMemoryGateway::new();
        gateway.add_credential("taken@example.edu", "secret1");

        let result = gateway.sign_up("TAKEN@example.edu", "secret2").await;
        assert!(matches!(result, Err(GatewayError::AlreadyRegistered)));
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent() {
        let gateway = InMemoryGateway::new();
        gateway.add_credential("ada@example.edu", "hunter22");
        let session = gateway
            .sign_in_with_password("ada@example.edu", "hunter22")
            .await
            .unwrap();

        gateway.sign_out(&session.access_token).await.unwrap();
        gateway.sign_out(&session.access_token).await.unwrap();

        assert_eq!(gateway.active_sessions(), 0);
        assert!(gateway.get_user(&session.access_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_select_filters_orders_and_limits() {
        let gateway = InMemoryGateway::new();
        gateway.insert_row("courses", json!({"name": "Rust", "is_active": true}));
        gateway.insert_row("courses", json!({"name": "Algebra", "is_active": true}));
        gateway.insert_row("courses", json!({"name": "Latin", "is_active": false}));

        let rows = gateway
            .select(
                &SelectQuery::from("courses").eq("is_active", true).order("name"),
                None,
            )
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Algebra", "Rust"]);

        let single = gateway
            .select(&SelectQuery::from("courses").eq("is_active", true).single(), None)
            .await
            .unwrap();
        assert_eq!(single.len(), 1);

        let none = gateway
            .select(&SelectQuery::from("missing").single(), None)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id_batch() {
        let gateway = InMemoryGateway::new();
        gateway.insert_row("users", json!({"id": "a"}));

        let result = gateway
            .insert("users", vec![json!({"id": "b"}), json!({"id": "a"})], None)
            .await;

        assert!(matches!(result, Err(GatewayError::Api { status: 409, .. })));
        assert_eq!(gateway.rows("users").len(), 1);
    }

    #[tokio::test]
    async fn test_failure_injection_and_call_log() {
        let gateway = InMemoryGateway::new();
        gateway.fail(GatewayOperation::Health);

        assert!(gateway.health().await.is_err());
        gateway.recover(GatewayOperation::Health);
        assert!(gateway.health().await.is_ok());

        assert_eq!(
            gateway.calls(),
            vec![GatewayOperation::Health, GatewayOperation::Health]
        );
        assert_eq!(gateway.call_count(GatewayOperation::Select), 0);
    }

    #[tokio::test]
    async fn test_delete_user_drops_credential_and_sessions() {
        let gateway = InMemoryGateway::new();
        let outcome = gateway.sign_up("gone@example.edu", "secret1").await.unwrap();

        gateway.delete_user(outcome.user().id).await.unwrap();

        assert!(!gateway.has_credential("gone@example.edu"));
        assert_eq!(gateway.active_sessions(), 0);
    }
}
