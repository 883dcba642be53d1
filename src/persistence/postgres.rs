//! PostgreSQL implementation of the persistence layer.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::models::LoginRecord;
use super::{LoginStore, StoreTransaction};
use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError::Persistence`] if the database is
    /// unreachable or rejects the credentials.
    pub async fn connect(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| PipelineError::Persistence(format!("connect failed: {e}")))?;

        Ok(Self::new(pool))
    }

    /// Closes every pooled connection. Waits for checked-out connections
    /// to be returned first.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LoginStore for PostgresStore {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction, PipelineError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PipelineError::Persistence(format!("begin failed: {e}")))?;

        Ok(PostgresTransaction { tx })
    }
}

/// Open PostgreSQL transaction. Dropping it without committing rolls back.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl fmt::Debug for PostgresTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresTransaction").finish_non_exhaustive()
    }
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn insert_batch(
        &mut self,
        table: &str,
        rows: &[LoginRecord],
    ) -> Result<u64, PipelineError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder = insert_query(table, rows);
        let result = builder
            .build()
            .execute(&mut *self.tx)
            .await
            .map_err(|e| PipelineError::Persistence(format!("insert into {table} failed: {e}")))?;

        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), PipelineError> {
        self.tx
            .commit()
            .await
            .map_err(|e| PipelineError::Persistence(format!("commit failed: {e}")))
    }

    async fn rollback(self) -> Result<(), PipelineError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| PipelineError::Persistence(format!("rollback failed: {e}")))
    }
}

/// Builds `INSERT INTO {table} (columns) VALUES (...), (...)` with one bind
/// per column per row, in [`LoginRecord::COLUMNS`] order.
fn insert_query<'a>(table: &str, rows: &'a [LoginRecord]) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {table} ({}) ",
        LoginRecord::COLUMNS.join(", ")
    ));
    builder.push_values(rows, |mut row, record| {
        row.push_bind(record.user_id.clone())
            .push_bind(record.device_type.clone())
            .push_bind(record.masked_ip.clone())
            .push_bind(record.masked_device_id.clone())
            .push_bind(record.locale.clone())
            .push_bind(record.app_version)
            .push_bind(record.create_date);
    });
    builder
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(user_id: &str) -> LoginRecord {
        let Some(create_date) = NaiveDate::from_ymd_opt(2024, 5, 1) else {
            panic!("valid date");
        };
        LoginRecord {
            user_id: user_id.to_string(),
            device_type: "android".to_string(),
            masked_ip: "HMS4HZEAvKQkRE2EnIU8zQ==".to_string(),
            masked_device_id: "gWeBXo4YI5jGOtrEa0+gOA==".to_string(),
            locale: "en_US".to_string(),
            app_version: 2101,
            create_date,
        }
    }

    const COLUMNS: &str =
        "user_id, device_type, masked_ip, masked_device_id, locale, app_version, create_date";

    #[test]
    fn single_row_binds_seven_placeholders() {
        let rows = [record("u1")];
        let builder = insert_query("user_logins", &rows);
        assert_eq!(
            builder.sql(),
            format!("INSERT INTO user_logins ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)")
        );
    }

    #[test]
    fn rows_are_numbered_consecutively() {
        let rows = [record("u1"), record("u2")];
        let builder = insert_query("user_logins", &rows);
        assert_eq!(
            builder.sql(),
            format!(
                "INSERT INTO user_logins ({COLUMNS}) VALUES \
                 ($1, $2, $3, $4, $5, $6, $7), ($8, $9, $10, $11, $12, $13, $14)"
            )
        );
    }

    #[test]
    fn schema_qualified_table_is_kept() {
        let rows = [record("u1")];
        let builder = insert_query("audit.user_logins", &rows);
        assert!(builder.sql().starts_with("INSERT INTO audit.user_logins ("));
    }
}
