//! Enrollments (`enrollments` table).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use student_portal_core::{AccountId, CourseId, EnrollmentId, EnrollmentStatus};

/// A stored enrollment of an account in a course.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Enrollment {
    #[serde(default)]
    pub id: Option<EnrollmentId>,
    pub student_id: AccountId,
    pub course_id: CourseId,
    pub enrollment_date: DateTime<Utc>,
    pub status: EnrollmentStatus,
}

/// An enrollment about to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentDraft {
    pub student_id: AccountId,
    pub course_id: CourseId,
    pub enrollment_date: DateTime<Utc>,
    pub status: EnrollmentStatus,
}

impl EnrollmentDraft {
    /// A new active enrollment dated `submitted_at`.
    #[must_use]
    pub fn active(student_id: AccountId, course_id: CourseId, submitted_at: DateTime<Utc>) -> Self {
        Self {
            student_id,
            course_id,
            enrollment_date: submitted_at,
            status: EnrollmentStatus::Active,
        }
    }
}
