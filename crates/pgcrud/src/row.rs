//! Result row decoding.

use crate::error::{DbError, DbResult};
use tokio_postgres::Row;
use tokio_postgres::types::Type;

/// One result row as an ordered column→value mapping.
pub type RowMap = serde_json::Map<String, serde_json::Value>;

/// Decode a row into a [`RowMap`], driven by each column's declared type.
///
/// NULLs map to JSON null. Dates and timestamps render as their canonical
/// text forms. A column type with no mapping here is a decode error rather
/// than a silent drop.
pub fn row_to_map(row: &Row) -> DbResult<RowMap> {
    let mut map = RowMap::new();
    for (idx, col) in row.columns().iter().enumerate() {
        let ty = col.type_();
        let value = match *ty {
            Type::BOOL => row
                .try_get::<_, Option<bool>>(idx)
                .map(|v| v.map(serde_json::Value::Bool).unwrap_or(serde_json::Value::Null)),
            Type::INT2 => row
                .try_get::<_, Option<i16>>(idx)
                .map(|v| json_or_null(v.map(i64::from))),
            Type::INT4 => row
                .try_get::<_, Option<i32>>(idx)
                .map(|v| json_or_null(v.map(i64::from))),
            Type::INT8 => row
                .try_get::<_, Option<i64>>(idx)
                .map(|v| json_or_null(v)),
            Type::FLOAT4 => row
                .try_get::<_, Option<f32>>(idx)
                .map(|v| float_or_null(v.map(f64::from))),
            Type::FLOAT8 => row
                .try_get::<_, Option<f64>>(idx)
                .map(|v| float_or_null(v)),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
                .try_get::<_, Option<String>>(idx)
                .map(|v| json_or_null(v)),
            Type::DATE => row
                .try_get::<_, Option<chrono::NaiveDate>>(idx)
                .map(|v| json_or_null(v.map(|d| d.to_string()))),
            Type::TIMESTAMP => row
                .try_get::<_, Option<chrono::NaiveDateTime>>(idx)
                .map(|v| json_or_null(v.map(|t| t.to_string()))),
            Type::TIMESTAMPTZ => row
                .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
                .map(|v| json_or_null(v.map(|t| t.to_rfc3339()))),
            Type::JSON | Type::JSONB => row
                .try_get::<_, Option<serde_json::Value>>(idx)
                .map(|v| v.unwrap_or(serde_json::Value::Null)),
            _ => {
                return Err(DbError::decode(
                    col.name(),
                    format!("unsupported column type {ty}"),
                ));
            }
        }
        .map_err(|e| DbError::decode(col.name(), e.to_string()))?;
        map.insert(col.name().to_string(), value);
    }
    Ok(map)
}

fn json_or_null<T: Into<serde_json::Value>>(v: Option<T>) -> serde_json::Value {
    v.map(Into::into).unwrap_or(serde_json::Value::Null)
}

fn float_or_null(v: Option<f64>) -> serde_json::Value {
    v.and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
