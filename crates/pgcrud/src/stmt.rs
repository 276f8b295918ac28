//! Parameterized statement construction and execution.
//!
//! The builders are pure functions from a table name and ordered column→value
//! mappings to a [`Statement`]. They never touch a connection and never check
//! that tables or columns exist. Identifiers are spliced into the SQL text
//! verbatim: they must come from a fixed, trusted schema list, never from raw
//! request input. Values are always bound through placeholders.

use crate::client::GenericClient;
use crate::error::DbResult;
use crate::row::{RowMap, row_to_map};
use crate::value::Scalar;
use tokio_postgres::types::ToSql;

/// Ordered column→value pairs.
///
/// Iteration order determines SQL clause order, and the bound argument list
/// is produced from the same iteration, which keeps placeholders and
/// arguments aligned by construction. Backed by a plain vector rather than a
/// map for exactly that reason.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnMap {
    entries: Vec<(String, Scalar)>,
}

impl ColumnMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column/value pair.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Scalar>) {
        self.entries.push((column.into(), value.into()));
    }

    /// Append a column/value pair, consuming version for chaining.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.push(column, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl<C: Into<String>, V: Into<Scalar>> FromIterator<(C, V)> for ColumnMap {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(c, v)| (c.into(), v.into()))
                .collect(),
        }
    }
}

/// Parameterized SQL text plus its ordered bound arguments.
///
/// Placeholders are `$1..$n`; their count always equals the argument list
/// length and their positions correspond left to right.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Scalar>,
}

/// The normalized result of running a [`Statement`].
#[derive(Debug)]
pub enum Outcome {
    /// Result rows of a read statement.
    Rows(Vec<RowMap>),
    /// Affected-row count of a write statement. Not the same metric as a
    /// result-set row count.
    Affected(u64),
}

impl Statement {
    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound arguments, in placeholder order.
    pub fn params(&self) -> &[Scalar] {
        &self.params
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }

    /// Execute and return the result rows as mappings.
    ///
    /// An empty result set is a valid zero-length result, not an error.
    pub async fn fetch(&self, conn: &impl GenericClient) -> DbResult<Vec<RowMap>> {
        let rows = conn.query(&self.sql, &self.params_ref()).await?;
        rows.iter().map(row_to_map).collect()
    }

    /// Execute and return the number of affected rows.
    pub async fn execute(&self, conn: &impl GenericClient) -> DbResult<u64> {
        conn.execute(&self.sql, &self.params_ref()).await
    }

    /// Unified execution entry point.
    ///
    /// `want_rows` picks between [`Statement::fetch`] and
    /// [`Statement::execute`] semantics.
    pub async fn run(&self, conn: &impl GenericClient, want_rows: bool) -> DbResult<Outcome> {
        if want_rows {
            Ok(Outcome::Rows(self.fetch(conn).await?))
        } else {
            Ok(Outcome::Affected(self.execute(conn).await?))
        }
    }
}

/// Append `WHERE c1 = $n AND c2 = $n+1 ...` for each filter in iteration
/// order, binding values in the same order. No-op when `filters` is empty.
fn push_filters(sql: &mut String, params: &mut Vec<Scalar>, filters: &ColumnMap) {
    for (i, (column, value)) in filters.iter().enumerate() {
        if i == 0 {
            sql.push_str(" WHERE ");
        } else {
            sql.push_str(" AND ");
        }
        sql.push_str(column);
        sql.push_str(" = $");
        sql.push_str(&(params.len() + 1).to_string());
        params.push(value.clone());
    }
}

/// Build a SELECT statement.
///
/// Empty `columns` selects `*`; empty `filters` omits the WHERE clause.
/// Filters are equality matches joined with AND, nothing else.
pub fn build_select(table: &str, columns: &[&str], filters: &ColumnMap) -> Statement {
    let projection = if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    };
    let mut sql = format!("SELECT {} FROM {}", projection, table);
    let mut params = Vec::new();
    push_filters(&mut sql, &mut params, filters);
    Statement { sql, params }
}

/// Build an INSERT statement.
///
/// An empty `values` produces an empty column/value list, which the backend
/// rejects; the builder does not pre-validate.
pub fn build_insert(table: &str, values: &ColumnMap) -> Statement {
    let mut params = Vec::with_capacity(values.len());
    let mut columns = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (column, value) in values.iter() {
        columns.push(column);
        params.push(value.clone());
        placeholders.push(format!("${}", params.len()));
    }
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );
    Statement { sql, params }
}

/// Build an UPDATE statement.
///
/// Arguments are `values` in order followed by `filters` in order. Empty
/// `filters` updates every row; guarding against that is the caller's
/// responsibility, not the builder's.
pub fn build_update(table: &str, values: &ColumnMap, filters: &ColumnMap) -> Statement {
    let mut params = Vec::with_capacity(values.len() + filters.len());
    let mut sets = Vec::with_capacity(values.len());
    for (column, value) in values.iter() {
        params.push(value.clone());
        sets.push(format!("{} = ${}", column, params.len()));
    }
    let mut sql = format!("UPDATE {} SET {}", table, sets.join(", "));
    push_filters(&mut sql, &mut params, filters);
    Statement { sql, params }
}

/// Build a DELETE statement.
///
/// Empty `filters` deletes every row, again a caller concern.
pub fn build_delete(table: &str, filters: &ColumnMap) -> Statement {
    let mut sql = format!("DELETE FROM {}", table);
    let mut params = Vec::new();
    push_filters(&mut sql, &mut params, filters);
    Statement { sql, params }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_all() {
        let stmt = build_select("student", &[], &ColumnMap::new());
        assert_eq!(stmt.sql(), "SELECT * FROM student");
        assert!(stmt.params().is_empty());
        assert!(!stmt.sql().contains("WHERE"));
    }

    #[test]
    fn select_with_projection() {
        let stmt = build_select("student", &["a", "b"], &ColumnMap::new());
        assert_eq!(stmt.sql(), "SELECT a, b FROM student");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn select_with_filters() {
        let filters = ColumnMap::new()
            .with("first_name", "John")
            .with("last_name", "Doe");
        let stmt = build_select("student", &[], &filters);
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM student WHERE first_name = $1 AND last_name = $2"
        );
        assert_eq!(
            stmt.params(),
            &[Scalar::Text("John".into()), Scalar::Text("Doe".into())]
        );
    }

    #[test]
    fn select_placeholder_count_matches_filter_count() {
        let filters = ColumnMap::new()
            .with("a", 1i64)
            .with("b", 2i64)
            .with("c", 3i64);
        let stmt = build_select("t", &[], &filters);
        let placeholders = stmt.sql().matches('$').count();
        assert_eq!(placeholders, filters.len());
        assert_eq!(stmt.params().len(), filters.len());
    }

    #[test]
    fn select_with_projection_and_filters() {
        let filters = ColumnMap::new().with("enrollment_year", 2021i64);
        let stmt = build_select("student", &["first_name", "email"], &filters);
        assert_eq!(
            stmt.sql(),
            "SELECT first_name, email FROM student WHERE enrollment_year = $1"
        );
        assert_eq!(stmt.params(), &[Scalar::Int(2021)]);
    }

    #[test]
    fn insert_binds_values_in_order() {
        let values = ColumnMap::new().with("x", 1i64).with("y", 2i64);
        let stmt = build_insert("t", &values);
        assert_eq!(stmt.sql(), "INSERT INTO t (x, y) VALUES ($1, $2)");
        assert_eq!(stmt.params(), &[Scalar::Int(1), Scalar::Int(2)]);
    }

    #[test]
    fn insert_empty_values_is_left_to_the_backend() {
        let stmt = build_insert("t", &ColumnMap::new());
        assert_eq!(stmt.sql(), "INSERT INTO t () VALUES ()");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn update_values_then_filters() {
        let values = ColumnMap::new().with("x", 1i64);
        let filters = ColumnMap::new().with("id", 5i64);
        let stmt = build_update("t", &values, &filters);
        assert_eq!(stmt.sql(), "UPDATE t SET x = $1 WHERE id = $2");
        assert_eq!(stmt.params(), &[Scalar::Int(1), Scalar::Int(5)]);
    }

    #[test]
    fn update_without_filters_has_no_where() {
        let values = ColumnMap::new().with("x", 1i64);
        let stmt = build_update("t", &values, &ColumnMap::new());
        assert_eq!(stmt.sql(), "UPDATE t SET x = $1");
        assert_eq!(stmt.params(), &[Scalar::Int(1)]);
    }

    #[test]
    fn update_multiple_sets_and_filters() {
        let values = ColumnMap::new().with("a", "p").with("b", "q");
        let filters = ColumnMap::new().with("id", 9i64).with("flag", true);
        let stmt = build_update("t", &values, &filters);
        assert_eq!(
            stmt.sql(),
            "UPDATE t SET a = $1, b = $2 WHERE id = $3 AND flag = $4"
        );
        assert_eq!(stmt.params().len(), 4);
    }

    #[test]
    fn delete_with_filter() {
        let filters = ColumnMap::new().with("id", 5i64);
        let stmt = build_delete("t", &filters);
        assert_eq!(stmt.sql(), "DELETE FROM t WHERE id = $1");
        assert_eq!(stmt.params(), &[Scalar::Int(5)]);
    }

    #[test]
    fn delete_without_filter_targets_every_row() {
        let stmt = build_delete("t", &ColumnMap::new());
        assert_eq!(stmt.sql(), "DELETE FROM t");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn builders_are_idempotent() {
        let values = ColumnMap::new().with("x", 1i64);
        let filters = ColumnMap::new().with("id", 5i64);
        assert_eq!(
            build_select("t", &["a"], &filters),
            build_select("t", &["a"], &filters)
        );
        assert_eq!(build_insert("t", &values), build_insert("t", &values));
        assert_eq!(
            build_update("t", &values, &filters),
            build_update("t", &values, &filters)
        );
        assert_eq!(build_delete("t", &filters), build_delete("t", &filters));
    }
}
