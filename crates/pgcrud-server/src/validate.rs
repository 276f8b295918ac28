//! Request payload validation.
//!
//! Checks run before any write statement is built. Field-level rules are
//! pure; the email uniqueness check queries the database.

use pgcrud::{ColumnMap, GenericClient, Scalar, build_select};

use crate::error::{ApiError, Result};
use crate::schema::TableSpec;

const EMPLOYEE_TYPES: &[&str] = &["Professor", "Lecturer", "Staff"];
const ENROLLMENT_YEARS: std::ops::RangeInclusive<i64> = 2016..=2023;

fn value_of<'a>(values: &'a ColumnMap, column: &str) -> Option<&'a Scalar> {
    values.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
}

fn valid_enrollment_year(value: &Scalar) -> bool {
    matches!(value, Scalar::Int(year) if ENROLLMENT_YEARS.contains(year))
}

fn valid_employee_type(value: &Scalar) -> bool {
    matches!(value, Scalar::Text(t) if EMPLOYEE_TYPES.contains(&t.as_str()))
}

/// Reject an email already held by a row other than `except`.
async fn check_email_free(
    db: &impl GenericClient,
    spec: &TableSpec,
    email: &Scalar,
    except: Option<i64>,
) -> Result<()> {
    let filters = ColumnMap::new().with("email", email.clone());
    let taken = build_select(spec.table, &[spec.key], &filters)
        .fetch(db)
        .await?;
    let own = except.map(serde_json::Value::from);
    if taken.iter().any(|row| row.get(spec.key) != own.as_ref()) {
        return Err(ApiError::bad_request("email already exists"));
    }
    Ok(())
}

fn check_fields(spec: &TableSpec, values: &ColumnMap, insert: bool) -> Result<()> {
    match spec.resource {
        "students" => match value_of(values, "enrollment_year") {
            Some(year) if !valid_enrollment_year(year) => Err(ApiError::bad_request(
                "enrollment_year must be between 2016 and 2023",
            )),
            None if insert => Err(ApiError::bad_request("enrollment_year is required")),
            _ => Ok(()),
        },
        // employee_type is optional; only a present value is checked.
        "employees" => match value_of(values, "employee_type") {
            Some(kind) if !valid_employee_type(kind) => Err(ApiError::bad_request(
                "employee_type must be one of Professor, Lecturer, Staff",
            )),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Validate a create payload.
pub async fn check_insert(
    db: &impl GenericClient,
    spec: &TableSpec,
    values: &ColumnMap,
) -> Result<()> {
    check_fields(spec, values, true)?;
    let email = match value_of(values, "email") {
        None | Some(Scalar::Null) => {
            return Err(ApiError::bad_request("email is required"));
        }
        Some(email) => email,
    };
    check_email_free(db, spec, email, None).await
}

/// Validate an update payload against the row identified by `id`. Fields
/// absent from the payload stay as they are and are not checked.
pub async fn check_update(
    db: &impl GenericClient,
    spec: &TableSpec,
    id: i64,
    values: &ColumnMap,
) -> Result<()> {
    check_update_fields(spec, values)?;
    if let Some(email) = value_of(values, "email") {
        check_email_free(db, spec, email, Some(id)).await?;
    }
    Ok(())
}

fn check_update_fields(spec: &TableSpec, values: &ColumnMap) -> Result<()> {
    if matches!(value_of(values, "email"), Some(Scalar::Null)) {
        return Err(ApiError::bad_request("email must not be null"));
    }
    check_fields(spec, values, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TABLES;

    fn students() -> &'static TableSpec {
        &TABLES[0]
    }

    fn employees() -> &'static TableSpec {
        &TABLES[1]
    }

    #[test]
    fn enrollment_year_bounds() {
        assert!(valid_enrollment_year(&Scalar::Int(2016)));
        assert!(valid_enrollment_year(&Scalar::Int(2023)));
        assert!(!valid_enrollment_year(&Scalar::Int(2015)));
        assert!(!valid_enrollment_year(&Scalar::Int(2024)));
        assert!(!valid_enrollment_year(&Scalar::Text("2020".into())));
        assert!(!valid_enrollment_year(&Scalar::Null));
    }

    #[test]
    fn employee_type_whitelist() {
        assert!(valid_employee_type(&Scalar::Text("Professor".into())));
        assert!(valid_employee_type(&Scalar::Text("Lecturer".into())));
        assert!(valid_employee_type(&Scalar::Text("Staff".into())));
        assert!(!valid_employee_type(&Scalar::Text("Intern".into())));
        assert!(!valid_employee_type(&Scalar::Text("professor".into())));
        assert!(!valid_employee_type(&Scalar::Int(1)));
    }

    #[test]
    fn insert_requires_enrollment_year() {
        let values = ColumnMap::new().with("email", "a@b.c");
        assert!(check_fields(students(), &values, true).is_err());
        let values = values.with("enrollment_year", 2020i64);
        assert!(check_fields(students(), &values, true).is_ok());
    }

    #[test]
    fn employee_type_is_optional_on_insert() {
        let values = ColumnMap::new()
            .with("email", "a@b.c")
            .with("first_name", "Ada");
        assert!(check_fields(employees(), &values, true).is_ok());
        let values = values.with("employee_type", "Staff");
        assert!(check_fields(employees(), &values, true).is_ok());
        let values = ColumnMap::new().with("employee_type", "Intern");
        assert!(check_fields(employees(), &values, true).is_err());
    }

    #[test]
    fn update_skips_absent_fields() {
        let values = ColumnMap::new().with("first_name", "Ada");
        assert!(check_update_fields(students(), &values).is_ok());
        assert!(check_update_fields(employees(), &values).is_ok());
    }

    #[test]
    fn update_still_checks_present_fields() {
        let values = ColumnMap::new().with("enrollment_year", 1999i64);
        assert!(check_update_fields(students(), &values).is_err());
        let values = ColumnMap::new().with("employee_type", "Janitor");
        assert!(check_update_fields(employees(), &values).is_err());
        let values = ColumnMap::new().with("email", Scalar::Null);
        assert!(check_update_fields(students(), &values).is_err());
    }
}
