//! Courses and the in-progress course selection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use student_portal_core::{CourseId, Price};

/// An active course offered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub duration_weeks: u32,
    pub category: Option<String>,
}

/// Raw `courses` row as returned by the gateway.
#[derive(Debug, Deserialize)]
pub(crate) struct CourseRow {
    pub id: CourseId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_weeks: i64,
    #[serde(default)]
    pub category: Option<String>,
}

/// Courses a student has picked on the selection screen.
///
/// Kept in the server-side session between toggles. Order is the order in
/// which courses were picked; a course appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseSelection(Vec<CourseId>);

impl CourseSelection {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Add the course if absent, remove it if present.
    ///
    /// Returns `true` if the course is selected afterwards.
    pub fn toggle(&mut self, id: CourseId) -> bool {
        if let Some(index) = self.0.iter().position(|selected| *selected == id) {
            self.0.remove(index);
            false
        } else {
            self.0.push(id);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: CourseId) -> bool {
        self.0.contains(&id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Selected ids in pick order.
    #[must_use]
    pub fn ids(&self) -> &[CourseId] {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Drop ids that are not in `catalog`.
    pub fn retain_available(&mut self, catalog: &[Course]) {
        self.0
            .retain(|id| catalog.iter().any(|course| course.id == *id));
    }

    /// The selected courses from `catalog`, in pick order.
    #[must_use]
    pub fn courses<'a>(&self, catalog: &'a [Course]) -> Vec<&'a Course> {
        self.0
            .iter()
            .filter_map(|id| catalog.iter().find(|course| course.id == *id))
            .collect()
    }

    /// Sum of the selected courses' prices.
    #[must_use]
    pub fn total(&self, catalog: &[Course]) -> Price {
        self.courses(catalog)
            .into_iter()
            .map(|course| course.price)
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn course(name: &str, dollars: i64) -> Course {
        Course {
            id: CourseId::generate(),
            name: name.to_string(),
            description: None,
            price: Price::new(Decimal::new(dollars, 0)).unwrap(),
            duration_weeks: 8,
            category: None,
        }
    }

    #[test]
    fn test_total_follows_toggles() {
        let a = course("A", 100);
        let b = course("B", 250);
        let catalog = vec![a.clone(), b.clone()];
        let mut selection = CourseSelection::new();

        assert!(selection.toggle(a.id));
        assert!(selection.toggle(b.id));
        assert_eq!(selection.total(&catalog).to_string(), "$350");

        assert!(!selection.toggle(a.id));
        assert_eq!(selection.total(&catalog).to_string(), "$250");
        assert_eq!(selection.ids(), &[b.id]);
    }

    #[test]
    fn test_toggle_keeps_pick_order() {
        let a = course("A", 1);
        let b = course("B", 2);
        let c = course("C", 3);
        let catalog = vec![a.clone(), b.clone(), c.clone()];
        let mut selection = CourseSelection::new();

        selection.toggle(c.id);
        selection.toggle(a.id);
        selection.toggle(b.id);

        let names: Vec<_> = selection
            .courses(&catalog)
            .iter()
            .map(|course| course.name.as_str())
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_retain_available_drops_retired_courses() {
        let a = course("A", 100);
        let retired = course("Retired", 999);
        let mut selection = CourseSelection::new();
        selection.toggle(a.id);
        selection.toggle(retired.id);

        selection.retain_available(std::slice::from_ref(&a));

        assert_eq!(selection.len(), 1);
        assert!(selection.contains(a.id));
        assert!(!selection.contains(retired.id));
    }

    #[test]
    fn test_empty_selection_totals_zero() {
        let selection = CourseSelection::new();
        assert!(selection.is_empty());
        assert_eq!(selection.total(&[]), Price::ZERO);
    }

    #[test]
    fn test_selection_session_form() {
        let id = CourseId::generate();
        let mut selection = CourseSelection::new();
        selection.toggle(id);

        let json = serde_json::to_string(&selection).unwrap();
        assert_eq!(json, format!("[\"{id}\"]"));
    }
}
