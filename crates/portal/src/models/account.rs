//! Account profiles (`users` table).

use serde::{Deserialize, Serialize};

use student_portal_core::{AccountId, AccountRole, Email};

/// A portal account profile.
///
/// The id is the credential id issued by the gateway at sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: AccountRole,
}

/// Profile row written right after the credential is created.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub id: AccountId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: AccountRole,
}

impl NewAccount {
    /// A student profile; every self-registered account is a student.
    #[must_use]
    pub const fn student(
        id: AccountId,
        email: Email,
        full_name: String,
        phone: Option<String>,
    ) -> Self {
        Self {
            id,
            email,
            full_name,
            phone,
            role: AccountRole::Student,
        }
    }
}

/// Raw `users` row as returned by the gateway.
#[derive(Debug, Deserialize)]
pub(crate) struct AccountRow {
    pub id: AccountId,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_serializes_to_users_row() {
        let id = AccountId::generate();
        let account = NewAccount::student(
            id,
            Email::parse("ada@example.edu").unwrap(),
            "Ada Lovelace".to_string(),
            None,
        );

        let row = serde_json::to_value(&account).unwrap();
        assert_eq!(row["id"], id.to_string());
        assert_eq!(row["email"], "ada@example.edu");
        assert_eq!(row["full_name"], "Ada Lovelace");
        assert!(row["phone"].is_null());
        assert_eq!(row["role"], "student");
    }
}
