//! Account profile repository (`users` table).

use student_portal_core::{AccountId, AccountRole, Email};

use super::RepositoryError;
use crate::gateway::{AccessToken, IdentityGateway, SelectQuery};
use crate::models::Account;
use crate::models::NewAccount;
use crate::models::account::AccountRow;

const TABLE: &str = "users";

/// Repository for account profiles.
pub struct AccountRepository<'a> {
    gateway: &'a dyn IdentityGateway,
    token: Option<&'a AccessToken>,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository acting as the holder of `token`.
    #[must_use]
    pub const fn new(gateway: &'a dyn IdentityGateway, token: Option<&'a AccessToken>) -> Self {
        Self { gateway, token }
    }

    /// Get an account profile by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Gateway` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row has an invalid
    /// email, or a role that is missing or unrecognized.
    pub async fn get_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let query = SelectQuery::from(TABLE).eq("id", id).single();
        let rows = self.gateway.select(&query, self.token).await?;

        match rows.into_iter().next() {
            Some(value) => {
                let row: AccountRow = serde_json::from_value(value).map_err(|e| {
                    RepositoryError::DataCorruption(format!("malformed users row: {e}"))
                })?;
                Ok(Some(account_from_row(row)?))
            }
            None => Ok(None),
        }
    }

    /// Insert a profile row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a profile with this id exists.
    /// Returns `RepositoryError::Gateway` for other failures.
    pub async fn create(&self, account: &NewAccount) -> Result<(), RepositoryError> {
        let row = serde_json::to_value(account)
            .map_err(|e| RepositoryError::Gateway(e.into()))?;

        self.gateway
            .insert(TABLE, vec![row], self.token)
            .await
            .map_err(RepositoryError::from_insert)
    }
}

fn account_from_row(row: AccountRow) -> Result<Account, RepositoryError> {
    let email = Email::parse(&row.email).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid email in users row: {e}"))
    })?;

    let role = row
        .role
        .as_deref()
        .ok_or_else(|| RepositoryError::DataCorruption("users row has no role".to_owned()))?
        .parse::<AccountRole>()
        .map_err(RepositoryError::DataCorruption)?;

    Ok(Account {
        id: row.id,
        email,
        full_name: row.full_name.unwrap_or_default(),
        phone: row.phone.filter(|phone| !phone.trim().is_empty()),
        role,
    })
}
