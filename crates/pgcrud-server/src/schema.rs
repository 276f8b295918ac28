//! Trusted table registry.
//!
//! Identifiers handed to the SQL builders are always drawn from this fixed
//! list, never taken from request input directly. Request-supplied column
//! names are resolved through [`TableSpec::column`], which hands back the
//! static string or nothing.

/// One exposed table.
#[derive(Debug)]
pub struct TableSpec {
    /// URL path segment, e.g. `students`
    pub resource: &'static str,
    /// Table name in the database
    pub table: &'static str,
    /// Primary key column
    pub key: &'static str,
    /// All columns, primary key included
    pub columns: &'static [&'static str],
}

pub static TABLES: &[TableSpec] = &[
    TableSpec {
        resource: "students",
        table: "student",
        key: "student_id",
        columns: &[
            "student_id",
            "first_name",
            "last_name",
            "email",
            "enrollment_year",
        ],
    },
    TableSpec {
        resource: "employees",
        table: "employee",
        key: "employee_id",
        columns: &[
            "employee_id",
            "first_name",
            "last_name",
            "email",
            "employee_type",
        ],
    },
];

impl TableSpec {
    /// Resolve a request-supplied column name to its trusted static form.
    pub fn column(&self, name: &str) -> Option<&'static str> {
        self.columns.iter().copied().find(|c| *c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_resolves_to_static_name() {
        let spec = &TABLES[0];
        assert_eq!(spec.column("email"), Some("email"));
        assert_eq!(spec.column("student_id"), Some("student_id"));
        assert_eq!(spec.column("password"), None);
        assert_eq!(spec.column("email; DROP TABLE student"), None);
    }

    #[test]
    fn key_is_listed_in_columns() {
        for spec in TABLES {
            assert!(spec.column(spec.key).is_some());
        }
    }

    #[test]
    fn resources_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for spec in TABLES {
            assert!(seen.insert(spec.resource));
        }
    }
}
