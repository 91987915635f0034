//! Dashboard route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;

use student_portal_core::EnrollmentStatus;

use crate::db::enrollments::EnrollmentRepository;
use crate::filters;
use crate::middleware::{RequireAdmin, RequireStudent, access_token};
use crate::models::{Course, CurrentAccount, Enrollment};
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// One row of the student's enrollment list.
pub struct EnrollmentView {
    /// `None` when the course is no longer in the active catalog.
    pub course: Option<Course>,
    pub enrolled_on: String,
    pub status: EnrollmentStatus,
}

impl EnrollmentView {
    fn new(enrollment: &Enrollment, catalog: &[Course]) -> Self {
        Self {
            course: catalog
                .iter()
                .find(|course| course.id == enrollment.course_id)
                .cloned(),
            enrolled_on: enrollment.enrollment_date.format("%B %-d, %Y").to_string(),
            status: enrollment.status,
        }
    }
}

/// Student dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/student.html")]
pub struct StudentDashboardTemplate {
    pub account: CurrentAccount,
    pub enrollments: Vec<EnrollmentView>,
    /// Enrollments could not be loaded.
    pub unavailable: bool,
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/admin.html")]
pub struct AdminDashboardTemplate {
    pub account: CurrentAccount,
    pub courses: Vec<Course>,
    /// The catalog could not be loaded.
    pub unavailable: bool,
}

/// Display the student dashboard: the student's enrollments.
pub async fn student(
    State(state): State<AppState>,
    RequireStudent(account): RequireStudent,
    session: Session,
) -> impl IntoResponse {
    let token = access_token(&session).await;

    let catalog = CatalogService::new(state.gateway(), token.as_ref())
        .list_active_courses()
        .await;
    let enrollments = EnrollmentRepository::new(state.gateway(), token.as_ref())
        .list_for_account(account.id)
        .await;

    let (enrollments, unavailable) = match enrollments {
        Ok(enrollments) => (
            enrollments
                .iter()
                .map(|enrollment| EnrollmentView::new(enrollment, catalog.courses()))
                .collect(),
            false,
        ),
        Err(e) => {
            tracing::error!(account_id = %account.id, error = %e, "Failed to load enrollments");
            (Vec::new(), true)
        }
    };

    StudentDashboardTemplate {
        account,
        enrollments,
        unavailable,
    }
}

/// Display the admin dashboard: the active catalog.
pub async fn admin(
    State(state): State<AppState>,
    RequireAdmin(account): RequireAdmin,
    session: Session,
) -> impl IntoResponse {
    let token = access_token(&session).await;
    let catalog = CatalogService::new(state.gateway(), token.as_ref())
        .list_active_courses()
        .await;

    AdminDashboardTemplate {
        account,
        unavailable: catalog.is_unavailable(),
        courses: catalog.courses().to_vec(),
    }
}
