//! Table query builder.

use std::fmt::Display;

/// A filtered, ordered read from one gateway table.
///
/// Renders to PostgREST query parameters:
///
/// ```rust,ignore
/// let query = SelectQuery::from("courses").eq("is_active", true).order("name");
/// // select=*&is_active=eq.true&order=name.asc
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    table: String,
    columns: String,
    filters: Vec<(String, String)>,
    order: Option<String>,
    single: bool,
}

impl SelectQuery {
    /// Start a query against `table`, selecting every column.
    #[must_use]
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            single: false,
        }
    }

    /// Restrict the selected columns (PostgREST `select` syntax).
    #[must_use]
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    /// Keep rows whose `column` equals `value`.
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    /// Order ascending by `column`.
    #[must_use]
    pub fn order(mut self, column: &str) -> Self {
        self.order = Some(column.to_string());
        self
    }

    /// Expect at most one row.
    #[must_use]
    pub const fn single(mut self) -> Self {
        self.single = true;
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Equality filters as `(column, value)` pairs.
    #[must_use]
    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    #[must_use]
    pub fn order_column(&self) -> Option<&str> {
        self.order.as_deref()
    }

    #[must_use]
    pub const fn is_single(&self) -> bool {
        self.single
    }

    /// Query-string pairs for the table endpoint.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(
            self.filters
                .iter()
                .map(|(column, value)| (column.clone(), format!("eq.{value}"))),
        );
        if let Some(column) = &self.order {
            pairs.push(("order".to_string(), format!("{column}.asc")));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_query_pairs() {
        let query = SelectQuery::from("courses").eq("is_active", true).order("name");

        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("is_active".to_string(), "eq.true".to_string()),
                ("order".to_string(), "name.asc".to_string()),
            ]
        );
        assert!(!query.is_single());
    }

    #[test]
    fn test_single_with_columns() {
        let query = SelectQuery::from("users")
            .columns("role")
            .eq("id", "abc")
            .single();

        assert_eq!(query.table(), "users");
        assert!(query.is_single());
        assert_eq!(query.to_query_pairs()[0], ("select".to_string(), "role".to_string()));
        assert_eq!(query.filters(), &[("id".to_string(), "abc".to_string())]);
    }
}
