//! Course catalog.
//!
//! Fetches the active catalog on every view. A failed fetch never becomes an
//! error page: it yields [`CatalogListing::Unavailable`], which renders as an
//! empty list with a notice.

use crate::db::courses::CourseRepository;
use crate::gateway::{AccessToken, IdentityGateway};
use crate::models::Course;

/// Result of fetching the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogListing {
    /// Active courses ordered by name (possibly none).
    Loaded(Vec<Course>),
    /// The fetch failed; nothing to show.
    Unavailable,
}

impl CatalogListing {
    /// Courses to render; empty when unavailable.
    #[must_use]
    pub fn courses(&self) -> &[Course] {
        match self {
            Self::Loaded(courses) => courses,
            Self::Unavailable => &[],
        }
    }

    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// Course catalog service.
pub struct CatalogService<'a> {
    courses: CourseRepository<'a>,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(gateway: &'a dyn IdentityGateway, token: Option<&'a AccessToken>) -> Self {
        Self {
            courses: CourseRepository::new(gateway, token),
        }
    }

    /// Active courses ordered by name. Failures are logged, not returned.
    pub async fn list_active_courses(&self) -> CatalogListing {
        match self.courses.list_active().await {
            Ok(courses) => CatalogListing::Loaded(courses),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load course catalog");
                CatalogListing::Unavailable
            }
        }
    }
}
