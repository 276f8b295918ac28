//! Client trait and connection setup.

use crate::error::{DbError, DbResult};
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// A minimal database client boundary.
///
/// Statements go through two entry points: `query` for statements whose
/// result is a row set, `execute` for statements whose result is an
/// affected-row count. Backend errors propagate uninterpreted apart from
/// SQLSTATE classification in [`DbError::from_db_error`].
pub trait GenericClient: Send + Sync {
    /// Execute a statement and return all result rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = DbResult<u64>> + Send;
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(DbError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(DbError::from_db_error)
    }
}

impl<C: GenericClient> GenericClient for &C {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<Vec<Row>> {
        (*self).query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> DbResult<u64> {
        (*self).execute(sql, params).await
    }
}

/// Open a single connection to the database.
///
/// The connection driver is moved onto a background task; every statement
/// executed through the returned client auto-commits independently. There is
/// no pooling here: the whole service shares this one logical connection.
pub async fn connect(database_url: &str) -> DbResult<tokio_postgres::Client> {
    let (client, connection) = tokio_postgres::connect(database_url, NoTls)
        .await
        .map_err(|e| DbError::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("database connection error: {e}");
        }
    });

    Ok(client)
}
