//! Course catalog repository (`courses` table).

use student_portal_core::Price;

use super::RepositoryError;
use crate::gateway::{AccessToken, IdentityGateway, SelectQuery};
use crate::models::Course;
use crate::models::course::CourseRow;

const TABLE: &str = "courses";

/// Repository for the course catalog.
pub struct CourseRepository<'a> {
    gateway: &'a dyn IdentityGateway,
    token: Option<&'a AccessToken>,
}

impl<'a> CourseRepository<'a> {
    /// Create a new course repository.
    #[must_use]
    pub const fn new(gateway: &'a dyn IdentityGateway, token: Option<&'a AccessToken>) -> Self {
        Self { gateway, token }
    }

    /// Active courses ordered by name.
    ///
    /// Rows that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Gateway` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Course>, RepositoryError> {
        let query = SelectQuery::from(TABLE).eq("is_active", true).order("name");
        let rows = self.gateway.select(&query, self.token).await?;

        let courses = rows
            .into_iter()
            .filter_map(|value| {
                match serde_json::from_value::<CourseRow>(value)
                    .map_err(|e| RepositoryError::DataCorruption(format!("malformed courses row: {e}")))
                    .and_then(course_from_row)
                {
                    Ok(course) => Some(course),
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping course row");
                        None
                    }
                }
            })
            .collect();

        Ok(courses)
    }
}

fn course_from_row(row: CourseRow) -> Result<Course, RepositoryError> {
    let price = Price::new(row.price).map_err(|e| {
        RepositoryError::DataCorruption(format!("course {}: {e}", row.id))
    })?;

    let duration_weeks = u32::try_from(row.duration_weeks)
        .ok()
        .filter(|weeks| *weeks > 0)
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "course {}: duration must be a positive number of weeks (got {})",
                row.id, row.duration_weeks
            ))
        })?;

    Ok(Course {
        id: row.id,
        name: row.name,
        description: row.description,
        price,
        duration_weeks,
        category: row.category,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use student_portal_core::CourseId;

    use super::*;
    use crate::gateway::{GatewayOperation, InMemoryGateway};

    fn row(name: &str, price: serde_json::Value, weeks: i64, active: bool) -> serde_json::Value {
        json!({
            "id": CourseId::generate().to_string(),
            "name": name,
            "description": format!("{name} course"),
            "price": price,
            "duration_weeks": weeks,
            "category": "Computing",
            "is_active": active,
        })
    }

    #[tokio::test]
    async fn test_list_active_orders_by_name_and_skips_inactive() {
        let gateway = InMemoryGateway::new();
        gateway.insert_row(TABLE, row("Web Development", json!(250), 12, true));
        gateway.insert_row(TABLE, row("Data Science", json!("100.00"), 8, true));
        gateway.insert_row(TABLE, row("Archived", json!(10), 4, false));

        let courses = CourseRepository::new(&gateway, None)
            .list_active()
            .await
            .unwrap();

        let names: Vec<_> = courses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Data Science", "Web Development"]);
        assert_eq!(courses[0].price.to_string(), "$100");
    }

    #[tokio::test]
    async fn test_list_active_skips_corrupt_rows() {
        let gateway = InMemoryGateway::new();
        gateway.insert_row(TABLE, row("Negative", json!(-5), 4, true));
        gateway.insert_row(TABLE, row("Zero Weeks", json!(5), 0, true));
        gateway.insert_row(TABLE, json!({"name": "No Id", "is_active": true}));
        gateway.insert_row(TABLE, row("Fine", json!(5), 2, true));

        let courses = CourseRepository::new(&gateway, None)
            .list_active()
            .await
            .unwrap();

        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].name, "Fine");
    }

    #[tokio::test]
    async fn test_list_active_propagates_gateway_failure() {
        let gateway = InMemoryGateway::new();
        gateway.fail(GatewayOperation::Select);

        let result = CourseRepository::new(&gateway, None).list_active().await;

        assert!(matches!(result, Err(RepositoryError::Gateway(_))));
    }
}
