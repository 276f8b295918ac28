//! # pgcrud
//!
//! Parameterized CRUD statement building and execution for Postgres.
//!
//! ## Features
//!
//! - **Pure builders**: `build_select` / `build_insert` / `build_update` /
//!   `build_delete` turn a table name and ordered column→value mappings into
//!   SQL text plus a bound argument list, with no connection in sight
//! - **Placeholders everywhere**: values always travel as `$1..$n` arguments,
//!   never as spliced text
//! - **Normalized results**: reads come back as `Vec<RowMap>` (column name →
//!   JSON value), writes as an affected-row count
//! - **Dynamic values**: [`Scalar`] carries untyped input and encodes itself
//!   against the parameter type the backend reports
//!
//! ```ignore
//! use pgcrud::{ColumnMap, build_select, build_insert};
//!
//! let client = pgcrud::connect(&database_url).await?;
//!
//! let filters = ColumnMap::new().with("enrollment_year", 2021);
//! let rows = build_select("student", &[], &filters).fetch(&client).await?;
//!
//! let values = ColumnMap::new()
//!     .with("first_name", "Ada")
//!     .with("email", "ada@example.com");
//! let inserted = build_insert("student", &values).execute(&client).await?;
//! ```
//!
//! Table and column names are spliced into the SQL verbatim, so they must
//! come from a trusted schema list, never from untrusted input.

pub mod client;
pub mod error;
pub mod row;
pub mod stmt;
pub mod value;

pub use client::{GenericClient, connect};
pub use tokio_postgres;
pub use error::{DbError, DbResult};
pub use row::{RowMap, row_to_map};
pub use stmt::{
    ColumnMap, Outcome, Statement, build_delete, build_insert, build_select, build_update,
};
pub use value::Scalar;
