//! Course selection route handlers.
//!
//! The selection lives in the server-side session between requests. Each
//! request rebuilds the screen from a fresh catalog fetch.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use student_portal_core::{CourseId, Price};

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::gateway::AccessToken;
use crate::middleware::{RequireStudent, access_token};
use crate::models::{Course, CourseSelection, CurrentAccount, session_keys};
use crate::services::catalog::CatalogService;
use crate::routes::auth::MessageQuery;
use crate::services::enrollment::{EnrollmentError, EnrollmentScreen, EnrollmentSubmitter};
use crate::services::routing::Destination;
use crate::state::AppState;

/// Query code for a submission with nothing selected.
const EMPTY_SELECTION_CODE: &str = "empty";

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub course_id: CourseId,
}

/// A catalog entry on the selection screen.
pub struct CourseOption {
    pub course: Course,
    pub selected: bool,
}

/// Course selection page template.
#[derive(Template, WebTemplate)]
#[template(path = "courses/select.html")]
pub struct CourseSelectTemplate {
    pub full_name: String,
    pub options: Vec<CourseOption>,
    /// The catalog fetch failed.
    pub unavailable: bool,
    /// Selected courses in pick order.
    pub selected: Vec<Course>,
    pub total: Price,
    pub error: Option<&'static str>,
}

impl CourseSelectTemplate {
    /// Render the screen. Only states that still hold a catalog render here.
    fn from_screen(account: &CurrentAccount, screen: &EnrollmentScreen) -> Self {
        let selection = screen.selection();
        let (courses, unavailable) = screen
            .catalog()
            .map_or((&[][..], false), |catalog| {
                (catalog.courses(), catalog.is_unavailable())
            });

        Self {
            full_name: account.full_name.clone(),
            options: courses
                .iter()
                .map(|course| CourseOption {
                    course: course.clone(),
                    selected: selection.contains(course.id),
                })
                .collect(),
            unavailable,
            selected: selection.courses(courses).into_iter().cloned().collect(),
            total: selection.total(courses),
            error: screen.error_message(),
        }
    }
}

// =============================================================================
// Session helpers
// =============================================================================

async fn stored_selection(session: &Session) -> Result<CourseSelection, AppError> {
    Ok(session
        .get::<CourseSelection>(session_keys::COURSE_SELECTION)
        .await?
        .unwrap_or_default())
}

async fn store_selection(session: &Session, selection: &CourseSelection) -> Result<(), AppError> {
    if selection.is_empty() {
        session
            .remove::<CourseSelection>(session_keys::COURSE_SELECTION)
            .await?;
    } else {
        session
            .insert(session_keys::COURSE_SELECTION, selection)
            .await?;
    }
    Ok(())
}

/// Fetch the catalog and carry over the stored selection.
async fn load_screen(
    state: &AppState,
    session: &Session,
    token: Option<&AccessToken>,
) -> Result<EnrollmentScreen, AppError> {
    let catalog = CatalogService::new(state.gateway(), token)
        .list_active_courses()
        .await;
    let selection = stored_selection(session).await?;

    let screen = EnrollmentScreen::Loading.loaded(catalog, selection);
    // Retired courses may have been dropped
    store_selection(session, &screen.selection()).await?;

    Ok(screen)
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the course selection screen.
///
/// `?error=empty` shows the empty-selection message while nothing is
/// selected.
pub async fn show(
    State(state): State<AppState>,
    RequireStudent(account): RequireStudent,
    session: Session,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let token = access_token(&session).await;
    let mut screen = load_screen(&state, &session, token.as_ref()).await?;

    if query.error.as_deref() == Some(EMPTY_SELECTION_CODE) && screen.selection().is_empty() {
        screen = screen
            .submit()
            .finish(Err(EnrollmentError::EmptySelection));
    }

    Ok(CourseSelectTemplate::from_screen(&account, &screen))
}

/// Pick or unpick a course, then show the screen again.
pub async fn toggle(
    RequireStudent(account): RequireStudent,
    session: Session,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect, AppError> {
    let mut selection = stored_selection(&session).await?;
    let selected = selection.toggle(form.course_id);
    store_selection(&session, &selection).await?;

    tracing::debug!(
        account_id = %account.id,
        course_id = %form.course_id,
        selected,
        "Course selection changed"
    );

    Ok(Redirect::to(Destination::CourseSelection.path()))
}

/// Submit the selection as enrollments.
///
/// An empty selection is turned away before the gateway is touched. Success
/// clears the selection and continues to the dashboard. Failure re-renders
/// the screen with the selection intact.
pub async fn submit(
    State(state): State<AppState>,
    RequireStudent(account): RequireStudent,
    session: Session,
) -> Result<Response, AppError> {
    if stored_selection(&session).await?.is_empty() {
        tracing::debug!(account_id = %account.id, "Empty course selection submitted");
        return Ok(Redirect::to(&format!(
            "{}?error={EMPTY_SELECTION_CODE}",
            Destination::CourseSelection.path()
        ))
        .into_response());
    }

    let token = access_token(&session).await;
    let screen = load_screen(&state, &session, token.as_ref())
        .await?
        .submit();
    let selection = screen.selection();

    let count = selection.len().to_string();
    add_breadcrumb(
        "enrollment",
        "Submitting course selection",
        Some(&[("courses", count.as_str())][..]),
    );

    let result = EnrollmentSubmitter::new(state.gateway(), token.as_ref())
        .submit(account.id, &selection)
        .await;
    if let Err(e) = &result {
        tracing::warn!(account_id = %account.id, error = %e, "Enrollment submission failed");
    }

    match screen.finish(result) {
        EnrollmentScreen::Success { .. } => {
            store_selection(&session, &CourseSelection::new()).await?;
            Ok(Redirect::to(Destination::StudentDashboard.path()).into_response())
        }
        screen => Ok(CourseSelectTemplate::from_screen(&account, &screen).into_response()),
    }
}
