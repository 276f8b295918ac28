//! Dynamic scalar values bridging HTTP input, SQL parameters, and JSON output.

use crate::error::{DbError, DbResult};
use bytes::BytesMut;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// A scalar value bound to a statement placeholder.
///
/// Request data arrives untyped (JSON bodies, query strings), while the
/// backend expects a concrete type for every placeholder. `Scalar` carries the
/// value across that gap: it is constructed from request input and encodes
/// itself against whatever parameter type the backend reports at prepare time.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Convert a JSON value into a `Scalar`.
    ///
    /// Arrays and objects are not scalars and are rejected; integers that do
    /// not fit `i64` are rejected as well.
    pub fn from_json(value: &serde_json::Value) -> DbResult<Self> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(DbError::unsupported(format!("number out of range: {n}")))
                }
            }
            serde_json::Value::String(s) => Ok(Self::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
                DbError::unsupported("arrays and objects cannot be bound as scalar values"),
            ),
        }
    }

    /// Infer a `Scalar` from query-string text.
    ///
    /// Tries integer, then float, then boolean, and falls back to text. The
    /// encoding in [`ToSql`] is driven by the backend's parameter type anyway,
    /// so inference only has to be a reasonable first guess.
    pub fn parse(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Self::Float(f);
        }
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Convert into a JSON value for response bodies.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(b),
            Self::Int(i) => serde_json::Value::from(i),
            Self::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

fn mismatch(scalar: &Scalar, ty: &Type) -> Box<dyn std::error::Error + Sync + Send> {
    format!("cannot encode {scalar:?} as {ty}").into()
}

impl ToSql for Scalar {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Scalar::Null => Ok(IsNull::Yes),
            Scalar::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => b.to_string().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Scalar::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::INT8 => i.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => i.to_string().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Scalar::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::FLOAT8 => f.to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => f.to_string().to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            // Query-string values arrive as text even for typed columns, so
            // text converts to whatever the backend asks for.
            Scalar::Text(s) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                    s.to_sql(ty, out)
                }
                Type::INT2 => s.parse::<i16>()?.to_sql(ty, out),
                Type::INT4 => s.parse::<i32>()?.to_sql(ty, out),
                Type::INT8 => s.parse::<i64>()?.to_sql(ty, out),
                Type::FLOAT4 => s.parse::<f32>()?.to_sql(ty, out),
                Type::FLOAT8 => s.parse::<f64>()?.to_sql(ty, out),
                Type::BOOL => s.parse::<bool>()?.to_sql(ty, out),
                Type::DATE => s.parse::<chrono::NaiveDate>()?.to_sql(ty, out),
                Type::TIMESTAMP => s.parse::<chrono::NaiveDateTime>()?.to_sql(ty, out),
                Type::TIMESTAMPTZ => s.parse::<chrono::DateTime<chrono::Utc>>()?.to_sql(ty, out),
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out)
                }
                _ => Err(mismatch(self, ty)),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Acceptance is decided per value at encode time.
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_scalars() {
        assert_eq!(
            Scalar::from_json(&serde_json::Value::Null).unwrap(),
            Scalar::Null
        );
        assert_eq!(
            Scalar::from_json(&serde_json::json!(true)).unwrap(),
            Scalar::Bool(true)
        );
        assert_eq!(
            Scalar::from_json(&serde_json::json!(42)).unwrap(),
            Scalar::Int(42)
        );
        assert_eq!(
            Scalar::from_json(&serde_json::json!(2.5)).unwrap(),
            Scalar::Float(2.5)
        );
        assert_eq!(
            Scalar::from_json(&serde_json::json!("alice")).unwrap(),
            Scalar::Text("alice".to_string())
        );
    }

    #[test]
    fn from_json_rejects_compound_values() {
        assert!(Scalar::from_json(&serde_json::json!([1, 2])).is_err());
        assert!(Scalar::from_json(&serde_json::json!({"a": 1})).is_err());
    }

    #[test]
    fn parse_infers_types() {
        assert_eq!(Scalar::parse("5"), Scalar::Int(5));
        assert_eq!(Scalar::parse("-17"), Scalar::Int(-17));
        assert_eq!(Scalar::parse("2.5"), Scalar::Float(2.5));
        assert_eq!(Scalar::parse("true"), Scalar::Bool(true));
        assert_eq!(Scalar::parse("Doe"), Scalar::Text("Doe".to_string()));
    }

    #[test]
    fn into_json_round_trips() {
        assert_eq!(Scalar::Int(7).into_json(), serde_json::json!(7));
        assert_eq!(Scalar::Bool(false).into_json(), serde_json::json!(false));
        assert_eq!(
            Scalar::Text("x".to_string()).into_json(),
            serde_json::json!("x")
        );
        assert_eq!(Scalar::Null.into_json(), serde_json::Value::Null);
    }
}
