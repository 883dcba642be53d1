//! Batch pipeline: drains the queue into the store.
//!
//! Each iteration polls once, turns every valid message into a row,
//! inserts the rows in one transaction, and only after a successful commit
//! deletes the messages they came from. Anything not deleted comes back
//! after its visibility timeout, so delivery is at-least-once.

use std::future::Future;
use std::time::Duration;

use crate::config::{PipelineConfig, RunMode};
use crate::crypto::FieldCodec;
use crate::domain::{
    Batch, LoginTransformer, REQUIRED_FIELDS, RawEvent, all_required_fields_present,
    missing_fields,
};
use crate::error::PipelineError;
use crate::persistence::models::LoginRecord;
use crate::persistence::{LoginStore, StoreTransaction};
use crate::queue::{MessageQueue, QueueMessage};

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Receive calls made, including the final empty one.
    pub polls: u64,
    /// Messages returned by those calls.
    pub messages_received: u64,
    /// Messages skipped as malformed (left in the queue).
    pub messages_rejected: u64,
    /// Batches whose transaction committed.
    pub batches_committed: u64,
    /// Batches rolled back.
    pub batches_failed: u64,
    /// Rows written by committed batches.
    pub rows_inserted: u64,
    /// Messages acknowledged after a commit.
    pub messages_deleted: u64,
    /// Acknowledgments that failed after a commit (will be redelivered).
    pub delete_failures: u64,
}

/// Single-worker queue → store pipeline.
///
/// Steps are awaited one after another; at most one batch is ever in
/// flight.
#[derive(Debug)]
pub struct BatchPipeline<Q, S> {
    queue: Q,
    store: S,
    transformer: LoginTransformer,
    batch_size: i32,
    table: String,
    run_mode: RunMode,
}

impl<Q, S> BatchPipeline<Q, S>
where
    Q: MessageQueue,
    S: LoginStore,
{
    /// Creates a pipeline from `config`, deriving the field codec from its
    /// passphrase and IV.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the codec cannot be built.
    pub fn new(queue: Q, store: S, config: &PipelineConfig) -> Result<Self, PipelineError> {
        let codec = FieldCodec::from_passphrase(&config.key_passphrase, &config.iv)?;
        Ok(Self {
            queue,
            store,
            transformer: LoginTransformer::new(codec),
            batch_size: config.batch_size,
            table: config.target_table.clone(),
            run_mode: config.run_mode,
        })
    }

    /// Returns the transformer, and through it the codec, in use.
    #[must_use]
    pub const fn transformer(&self) -> &LoginTransformer {
        &self.transformer
    }

    /// Runs until the configured [`RunMode`] says stop.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Queue`] if a receive call fails. Message
    /// and batch failures are logged and counted instead.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Like [`BatchPipeline::run`], but also stops when `shutdown`
    /// completes. The signal is only observed between iterations, never
    /// between a commit and its deletes.
    ///
    /// # Errors
    ///
    /// Same as [`BatchPipeline::run`].
    pub async fn run_until<F>(&self, shutdown: F) -> Result<RunReport, PipelineError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut report = RunReport::default();
        let mut idle_backoff: Option<Duration> = None;

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                () = std::future::ready(()) => {}
            }

            if self.run_iteration(&mut report).await? {
                idle_backoff = None;
                continue;
            }

            match self.run_mode {
                RunMode::Drain => {
                    tracing::debug!("queue drained");
                    break;
                }
                RunMode::Continuous {
                    idle_backoff: initial,
                    max_idle_backoff,
                } => {
                    let delay = next_backoff(idle_backoff, initial, max_idle_backoff);
                    idle_backoff = Some(delay);
                    tracing::debug!(?delay, "queue empty, backing off");
                    tokio::select! {
                        () = &mut shutdown => {
                            tracing::info!("shutdown requested");
                            break;
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        Ok(report)
    }

    /// One poll → batch → persist → acknowledge cycle. Returns `false`
    /// when the poll came back empty.
    async fn run_iteration(&self, report: &mut RunReport) -> Result<bool, PipelineError> {
        let messages = self.queue.receive(self.batch_size).await?;
        report.polls += 1;
        if messages.is_empty() {
            return Ok(false);
        }

        tracing::debug!(count = messages.len(), "received messages");
        report.messages_received += messages.len() as u64;

        let batch = self.assemble_batch(messages, report);
        self.flush(batch, report).await;
        Ok(true)
    }

    fn assemble_batch(&self, messages: Vec<QueueMessage>, report: &mut RunReport) -> Batch {
        let mut batch = Batch::with_capacity(messages.len());
        for message in messages {
            match self.prepare(&message) {
                Ok(record) => batch.push(record, message.delete_handle),
                Err(err) => {
                    report.messages_rejected += 1;
                    tracing::warn!(
                        message_id = %message.id,
                        error = %err,
                        "skipping message, left in queue"
                    );
                }
            }
        }
        batch
    }

    fn prepare(&self, message: &QueueMessage) -> Result<LoginRecord, PipelineError> {
        let event = RawEvent::from_json(&message.body)?;
        if !all_required_fields_present(&event, &REQUIRED_FIELDS) {
            return Err(PipelineError::MalformedMessage(format!(
                "missing required fields: {}",
                missing_fields(&event, &REQUIRED_FIELDS).join(", ")
            )));
        }
        self.transformer.transform_now(&event)
    }

    /// Persists `batch` and, on commit, deletes its messages. Failures are
    /// absorbed here so the loop keeps going.
    async fn flush(&self, batch: Batch, report: &mut RunReport) {
        if batch.is_empty() {
            tracing::debug!("no valid messages in poll, skipping insert");
            return;
        }

        let rows = match self.persist(batch.records()).await {
            Ok(rows) => rows,
            Err(err) => {
                report.batches_failed += 1;
                tracing::error!(
                    error = %err,
                    records = batch.len(),
                    "batch insert failed, messages left for redelivery"
                );
                return;
            }
        };
        report.batches_committed += 1;
        report.rows_inserted += rows;

        let mut deleted = 0u64;
        for handle in batch.into_handles() {
            match self.queue.delete(&handle).await {
                Ok(()) => deleted += 1,
                Err(err) => {
                    report.delete_failures += 1;
                    tracing::warn!(error = %err, "delete after commit failed, row may be duplicated");
                }
            }
        }
        report.messages_deleted += deleted;

        tracing::info!(rows, deleted, table = %self.table, "batch committed");
    }

    async fn persist(&self, records: &[LoginRecord]) -> Result<u64, PipelineError> {
        let mut tx = self.store.begin().await?;
        match tx.insert_batch(&self.table, records).await {
            Ok(rows) => {
                tx.commit().await?;
                Ok(rows)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Shortest sleep between empty polls, whatever the configuration says.
const MIN_IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// Doubles the previous idle sleep, starting at `initial`, capped at `max`
/// and never below [`MIN_IDLE_BACKOFF`].
fn next_backoff(previous: Option<Duration>, initial: Duration, max: Duration) -> Duration {
    previous
        .map_or(initial, |d| d.saturating_mul(2))
        .min(max)
        .max(MIN_IDLE_BACKOFF)
}
