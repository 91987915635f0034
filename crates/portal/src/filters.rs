//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a course length, e.g. `1 week`, `8 weeks`.
///
/// Usage in templates: `{{ course.duration_weeks|weeks }}`
#[askama::filter_fn]
pub fn weeks(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(plural(value, "week", "weeks"))
}

/// Formats a selection count, e.g. `1 course selected`, `2 courses selected`.
///
/// Usage in templates: `{{ count|courses_selected }}`
#[askama::filter_fn]
pub fn courses_selected(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("{} selected", plural(value, "course", "courses")))
}

fn plural(value: impl Display, one: &str, many: &str) -> String {
    let count = value.to_string();
    if count == "1" {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "week", "weeks"), "1 week");
        assert_eq!(plural(8, "week", "weeks"), "8 weeks");
        assert_eq!(plural(0, "course", "courses"), "0 courses");
    }
}
