//! Repositories over the identity gateway's tables.
//!
//! # Tables
//!
//! - `users` - Account profiles (`id` equals the credential id)
//! - `courses` - Course catalog (read-only here)
//! - `enrollments` - One row per account and course
//!
//! Rows come back as JSON and are converted to domain models here. Rows whose
//! fields do not parse are reported as `DataCorruption` for single-row reads
//! and skipped with a warning for list reads.

pub mod accounts;
pub mod courses;
pub mod enrollments;

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Gateway request failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Stored data is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate primary key).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a gateway insert rejection, surfacing unique violations as `Conflict`.
    pub(crate) fn from_insert(error: GatewayError) -> Self {
        match error {
            GatewayError::Api { status: 409, message } => Self::Conflict(message),
            other => Self::Gateway(other),
        }
    }
}
