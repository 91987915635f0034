//! Enrollment submission and the course selection screen.

use chrono::{DateTime, Utc};
use thiserror::Error;

use student_portal_core::{AccountId, CourseId};

use crate::db::RepositoryError;
use crate::db::enrollments::EnrollmentRepository;
use crate::gateway::{AccessToken, IdentityGateway};
use crate::models::{CourseSelection, EnrollmentDraft};
use crate::services::catalog::CatalogListing;

/// Shown whenever a submission does not go through.
pub const SUBMISSION_FAILED_MESSAGE: &str = "Enrollment failed. Please try again.";

/// Shown when submitting with nothing selected.
pub const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one course.";

/// Errors that can occur when submitting enrollments.
#[derive(Debug, Error)]
pub enum EnrollmentError {
    /// Nothing selected; rejected before any gateway call.
    #[error("no courses selected")]
    EmptySelection,

    /// The batch insert failed. Partial writes are not detected.
    #[error("enrollment submission failed: {0}")]
    SubmissionFailed(#[from] RepositoryError),
}

impl EnrollmentError {
    /// Message safe to show on the selection screen.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::EmptySelection => EMPTY_SELECTION_MESSAGE,
            Self::SubmissionFailed(_) => SUBMISSION_FAILED_MESSAGE,
        }
    }
}

/// One active enrollment draft per selected course, all dated `submitted_at`.
#[must_use]
pub fn build_drafts(
    student_id: AccountId,
    selection: &CourseSelection,
    submitted_at: DateTime<Utc>,
) -> Vec<EnrollmentDraft> {
    selection
        .ids()
        .iter()
        .map(|course_id| EnrollmentDraft::active(student_id, *course_id, submitted_at))
        .collect()
}

/// Writes a student's selected courses as enrollments.
pub struct EnrollmentSubmitter<'a> {
    enrollments: EnrollmentRepository<'a>,
}

impl<'a> EnrollmentSubmitter<'a> {
    #[must_use]
    pub const fn new(gateway: &'a dyn IdentityGateway, token: Option<&'a AccessToken>) -> Self {
        Self {
            enrollments: EnrollmentRepository::new(gateway, token),
        }
    }

    /// Submit the selection as a single batch insert.
    ///
    /// Returns the number of enrollments written.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::EmptySelection` without calling the gateway
    /// if nothing is selected.
    /// Returns `EnrollmentError::SubmissionFailed` if the batch is rejected.
    pub async fn submit(
        &self,
        student_id: AccountId,
        selection: &CourseSelection,
    ) -> Result<usize, EnrollmentError> {
        if selection.is_empty() {
            return Err(EnrollmentError::EmptySelection);
        }

        let drafts = build_drafts(student_id, selection, Utc::now());
        self.enrollments.create_batch(&drafts).await?;

        tracing::info!(
            account_id = %student_id,
            courses = drafts.len(),
            "Enrollments submitted"
        );
        Ok(drafts.len())
    }
}

// =============================================================================
// Selection Screen
// =============================================================================

/// State of the course selection screen.
///
/// ```text
/// Loading -> Ready -> Selecting -> Submitting -> Success
///                         ^             |
///                         +-- Failure <-+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentScreen {
    Loading,
    Ready {
        catalog: CatalogListing,
    },
    Selecting {
        catalog: CatalogListing,
        selection: CourseSelection,
    },
    Submitting {
        catalog: CatalogListing,
        selection: CourseSelection,
    },
    /// Terminal; the user moves on to the dashboard.
    Success {
        enrolled: usize,
    },
    Failure {
        catalog: CatalogListing,
        selection: CourseSelection,
        message: &'static str,
    },
}

impl EnrollmentScreen {
    /// Catalog arrived. A stored selection is carried over, minus courses
    /// that are no longer offered.
    #[must_use]
    pub fn loaded(self, catalog: CatalogListing, mut selection: CourseSelection) -> Self {
        if !matches!(self, Self::Loading) {
            return self;
        }
        if let CatalogListing::Loaded(courses) = &catalog {
            selection.retain_available(courses);
        }
        Self::with_selection(catalog, selection)
    }

    fn with_selection(catalog: CatalogListing, selection: CourseSelection) -> Self {
        if selection.is_empty() {
            Self::Ready { catalog }
        } else {
            Self::Selecting { catalog, selection }
        }
    }

    /// Pick or unpick a course.
    #[must_use]
    pub fn toggle(self, course_id: CourseId) -> Self {
        match self {
            Self::Ready { catalog } => {
                let mut selection = CourseSelection::new();
                selection.toggle(course_id);
                Self::with_selection(catalog, selection)
            }
            Self::Selecting {
                catalog,
                mut selection,
            }
            | Self::Failure {
                catalog,
                mut selection,
                ..
            } => {
                selection.toggle(course_id);
                Self::with_selection(catalog, selection)
            }
            other => other,
        }
    }

    /// Submit pressed.
    #[must_use]
    pub fn submit(self) -> Self {
        match self {
            Self::Ready { catalog } => Self::Submitting {
                catalog,
                selection: CourseSelection::new(),
            },
            Self::Selecting { catalog, selection } | Self::Failure { catalog, selection, .. } => {
                Self::Submitting { catalog, selection }
            }
            other => other,
        }
    }

    /// Submission finished.
    #[must_use]
    pub fn finish(self, result: Result<usize, EnrollmentError>) -> Self {
        match (self, result) {
            (Self::Submitting { .. }, Ok(enrolled)) => Self::Success { enrolled },
            (Self::Submitting { catalog, selection }, Err(e)) => Self::Failure {
                catalog,
                selection,
                message: e.user_message(),
            },
            (other, _) => other,
        }
    }

    /// Dismiss a failure, back to selecting with the selection intact.
    #[must_use]
    pub fn dismiss(self) -> Self {
        match self {
            Self::Failure {
                catalog, selection, ..
            } => Self::with_selection(catalog, selection),
            other => other,
        }
    }

    /// The catalog, once loaded.
    #[must_use]
    pub const fn catalog(&self) -> Option<&CatalogListing> {
        match self {
            Self::Ready { catalog }
            | Self::Selecting { catalog, .. }
            | Self::Submitting { catalog, .. }
            | Self::Failure { catalog, .. } => Some(catalog),
            Self::Loading | Self::Success { .. } => None,
        }
    }

    /// The current selection, empty outside the selecting states.
    #[must_use]
    pub fn selection(&self) -> CourseSelection {
        match self {
            Self::Selecting { selection, .. }
            | Self::Submitting { selection, .. }
            | Self::Failure { selection, .. } => selection.clone(),
            _ => CourseSelection::new(),
        }
    }

    #[must_use]
    pub const fn error_message(&self) -> Option<&'static str> {
        match self {
            Self::Failure { message, .. } => Some(*message),
            _ => None,
        }
    }
}
