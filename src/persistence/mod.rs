//! Persistence layer: transactional batch insert of login rows.
//!
//! The pipeline talks to storage only through [`LoginStore`] and
//! [`StoreTransaction`]. The concrete implementation uses `sqlx::PgPool`
//! for async PostgreSQL access.

pub mod models;
pub mod postgres;

use async_trait::async_trait;

use crate::error::PipelineError;
use models::LoginRecord;

pub use postgres::{PostgresStore, PostgresTransaction};

/// Source of store transactions.
#[async_trait]
pub trait LoginStore: Send + Sync {
    /// Transaction handle produced by [`LoginStore::begin`].
    type Transaction: StoreTransaction;

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] if no connection is available.
    async fn begin(&self) -> Result<Self::Transaction, PipelineError>;
}

/// An open transaction. Nothing inserted through it is visible to other
/// readers until [`StoreTransaction::commit`] succeeds.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Inserts all `rows` into `table` as one statement, in
    /// [`LoginRecord::COLUMNS`] order. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] on any database failure; the
    /// transaction must then be rolled back.
    async fn insert_batch(&mut self, table: &str, rows: &[LoginRecord])
    -> Result<u64, PipelineError>;

    /// Makes the inserted rows durable.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] if the commit fails, in which
    /// case nothing from this transaction is kept.
    async fn commit(self) -> Result<(), PipelineError>;

    /// Discards the inserted rows.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Persistence`] if the rollback call fails.
    async fn rollback(self) -> Result<(), PipelineError>;
}
