//! Rows accumulated from one poll, paired with their acknowledgment tokens.

use super::DeleteHandle;
use crate::persistence::models::LoginRecord;

/// Append-only batch for a single polling iteration.
///
/// `records[i]` came from the delivery acknowledged by `handles[i]`. The
/// batch is consumed when flushed; handles only leave it through
/// [`Batch::into_handles`], after the rows are durable.
#[derive(Debug, Default)]
pub struct Batch {
    records: Vec<LoginRecord>,
    handles: Vec<DeleteHandle>,
}

impl Batch {
    /// Creates an empty batch sized for `capacity` messages.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            handles: Vec::with_capacity(capacity),
        }
    }

    /// Appends a row and the handle of the message it came from.
    pub fn push(&mut self, record: LoginRecord, handle: DeleteHandle) {
        self.records.push(record);
        self.handles.push(handle);
    }

    /// Rows in arrival order.
    #[must_use]
    pub fn records(&self) -> &[LoginRecord] {
        &self.records
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing in the poll was valid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Releases the handles for deletion, dropping the rows.
    #[must_use]
    pub fn into_handles(self) -> Vec<DeleteHandle> {
        self.handles
    }
}
