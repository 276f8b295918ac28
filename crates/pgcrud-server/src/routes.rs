//! HTTP routes and handlers.
//!
//! One generic handler set serves every registered table; the concrete
//! [`TableSpec`] arrives through a per-resource `Extension` layer.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
};
use pgcrud::{
    ColumnMap, RowMap, Scalar, build_delete, build_insert, build_select, build_update,
    tokio_postgres::Client,
};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, Result};
use crate::schema::{TABLES, TableSpec};
use crate::validate;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Client>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new().route("/", get(heartbeat));
    for spec in TABLES {
        let table = Router::new()
            .route("/", get(list).post(create))
            .route("/{id}", get(fetch_one).put(update_one).delete(delete_one))
            .layer(Extension(spec));
        app = app.nest(&format!("/{}", spec.resource), table);
    }
    app.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn heartbeat() -> Html<&'static str> {
    Html("<h1>Heartbeat</h1>")
}

/// Convert a JSON object body into an ordered column map, resolving every
/// key against the table's trusted column list.
fn body_to_columns(spec: &TableSpec, body: &serde_json::Map<String, serde_json::Value>) -> Result<ColumnMap> {
    let mut values = ColumnMap::new();
    for (key, value) in body {
        let column = spec
            .column(key)
            .ok_or_else(|| ApiError::bad_request(format!("unknown column: {key}")))?;
        let scalar = Scalar::from_json(value)
            .map_err(|e| ApiError::bad_request(format!("invalid value for {key}: {e}")))?;
        values.push(column, scalar);
    }
    Ok(values)
}

/// Split query parameters into a column projection and equality filters.
///
/// The reserved `fields` parameter carries a comma-separated projection;
/// every other parameter becomes an equality filter. Values are typed by
/// inference, with the database coercing the rest at bind time.
fn parse_query(
    spec: &TableSpec,
    params: &[(String, String)],
) -> Result<(Vec<&'static str>, ColumnMap)> {
    let mut fields = Vec::new();
    let mut filters = ColumnMap::new();
    for (key, value) in params {
        if key == "fields" {
            for name in value.split(',') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let column = spec
                    .column(name)
                    .ok_or_else(|| ApiError::bad_request(format!("unknown column: {name}")))?;
                fields.push(column);
            }
        } else {
            let column = spec
                .column(key)
                .ok_or_else(|| ApiError::bad_request(format!("unknown column: {key}")))?;
            filters.push(column, Scalar::parse(value));
        }
    }
    Ok((fields, filters))
}

/// `GET /{resource}` — list rows.
async fn list(
    State(state): State<AppState>,
    Extension(spec): Extension<&'static TableSpec>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<RowMap>>> {
    let (fields, filters) = parse_query(spec, &params)?;
    let rows = build_select(spec.table, &fields, &filters)
        .fetch(state.db.as_ref())
        .await?;
    Ok(Json(rows))
}

/// `GET /{resource}/{id}` — fetch one row by primary key.
async fn fetch_one(
    State(state): State<AppState>,
    Extension(spec): Extension<&'static TableSpec>,
    Path(id): Path<i64>,
) -> Result<Json<RowMap>> {
    let filters = ColumnMap::new().with(spec.key, id);
    let mut rows = build_select(spec.table, &[], &filters)
        .fetch(state.db.as_ref())
        .await?;
    match rows.pop() {
        Some(row) => Ok(Json(row)),
        None => Err(ApiError::not_found(format!("{} {id} not found", spec.key))),
    }
}

/// `POST /{resource}` — insert a row; responds 201 with the affected count.
async fn create(
    State(state): State<AppState>,
    Extension(spec): Extension<&'static TableSpec>,
    Json(body): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<(StatusCode, Json<u64>)> {
    let values = body_to_columns(spec, &body)?;
    if values.iter().any(|(c, _)| c == spec.key) {
        return Err(ApiError::bad_request(format!(
            "{} is assigned by the database",
            spec.key
        )));
    }
    validate::check_insert(state.db.as_ref(), spec, &values).await?;
    let affected = build_insert(spec.table, &values)
        .execute(state.db.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(affected)))
}

/// `PUT /{resource}/{id}` — partial update of one row by primary key.
async fn update_one(
    State(state): State<AppState>,
    Extension(spec): Extension<&'static TableSpec>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<Json<u64>> {
    // A missing row is a 404 regardless of what the body contains.
    let filters = ColumnMap::new().with(spec.key, id);
    let existing = build_select(spec.table, &[spec.key], &filters)
        .fetch(state.db.as_ref())
        .await?;
    if existing.is_empty() {
        return Err(ApiError::not_found(format!("{} {id} not found", spec.key)));
    }

    let values = body_to_columns(spec, &body)?;
    if values.is_empty() {
        return Err(ApiError::bad_request("no fields to update"));
    }
    if values.iter().any(|(c, _)| c == spec.key) {
        return Err(ApiError::bad_request(format!(
            "{} cannot be updated",
            spec.key
        )));
    }
    validate::check_update(state.db.as_ref(), spec, id, &values).await?;

    let affected = build_update(spec.table, &values, &filters)
        .execute(state.db.as_ref())
        .await?;
    Ok(Json(affected))
}

/// `DELETE /{resource}/{id}` — delete one row by primary key.
async fn delete_one(
    State(state): State<AppState>,
    Extension(spec): Extension<&'static TableSpec>,
    Path(id): Path<i64>,
) -> Result<Json<u64>> {
    let filters = ColumnMap::new().with(spec.key, id);
    let existing = build_select(spec.table, &[spec.key], &filters)
        .fetch(state.db.as_ref())
        .await?;
    if existing.is_empty() {
        return Err(ApiError::not_found(format!("{} {id} not found", spec.key)));
    }
    let affected = build_delete(spec.table, &filters)
        .execute(state.db.as_ref())
        .await?;
    Ok(Json(affected))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn students() -> &'static TableSpec {
        &TABLES[0]
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fields_param_becomes_projection() {
        let (fields, filters) =
            parse_query(students(), &params(&[("fields", "first_name,email")])).unwrap();
        assert_eq!(fields, vec!["first_name", "email"]);
        assert!(filters.is_empty());
    }

    #[test]
    fn fields_mix_with_filters() {
        let (fields, filters) = parse_query(
            students(),
            &params(&[("fields", "email"), ("enrollment_year", "2021")]),
        )
        .unwrap();
        assert_eq!(fields, vec!["email"]);
        let collected: Vec<_> = filters.iter().collect();
        assert_eq!(
            collected,
            vec![("enrollment_year", &Scalar::Int(2021))]
        );
    }

    #[test]
    fn empty_field_segments_are_skipped() {
        let (fields, _) =
            parse_query(students(), &params(&[("fields", " first_name,, email ,")])).unwrap();
        assert_eq!(fields, vec!["first_name", "email"]);
    }

    #[test]
    fn unknown_columns_are_rejected() {
        assert!(matches!(
            parse_query(students(), &params(&[("fields", "password")])),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            parse_query(students(), &params(&[("employee_type", "Staff")])),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn no_params_means_select_all() {
        let (fields, filters) = parse_query(students(), &[]).unwrap();
        assert!(fields.is_empty());
        assert!(filters.is_empty());
    }
}
