//! Enrollment repository (`enrollments` table).

use student_portal_core::AccountId;

use super::RepositoryError;
use crate::gateway::{AccessToken, IdentityGateway, SelectQuery};
use crate::models::{Enrollment, EnrollmentDraft};

const TABLE: &str = "enrollments";

/// Repository for enrollments.
pub struct EnrollmentRepository<'a> {
    gateway: &'a dyn IdentityGateway,
    token: Option<&'a AccessToken>,
}

impl<'a> EnrollmentRepository<'a> {
    /// Create a new enrollment repository.
    #[must_use]
    pub const fn new(gateway: &'a dyn IdentityGateway, token: Option<&'a AccessToken>) -> Self {
        Self { gateway, token }
    }

    /// Write all drafts as a single batch insert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a constraint violation.
    /// Returns `RepositoryError::Gateway` for other failures.
    pub async fn create_batch(&self, drafts: &[EnrollmentDraft]) -> Result<(), RepositoryError> {
        let rows = drafts
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RepositoryError::Gateway(e.into()))?;

        self.gateway
            .insert(TABLE, rows, self.token)
            .await
            .map_err(RepositoryError::from_insert)
    }

    /// Enrollments of one account, oldest first.
    ///
    /// Rows that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Gateway` if the query fails.
    pub async fn list_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Enrollment>, RepositoryError> {
        let query = SelectQuery::from(TABLE)
            .eq("student_id", account_id)
            .order("enrollment_date");
        let rows = self.gateway.select(&query, self.token).await?;

        Ok(rows
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Enrollment>(value) {
                Ok(enrollment) => Some(enrollment),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping enrollment row");
                    None
                }
            })
            .collect())
    }
}
