//! Queue layer: receive and acknowledge login-event messages.
//!
//! [`MessageQueue`] is the only view of the queue the pipeline has.
//! Received messages stay hidden from other consumers for the visibility
//! timeout and reappear unless deleted with their [`DeleteHandle`].

pub mod sqs;

use async_trait::async_trait;

use crate::domain::DeleteHandle;
use crate::error::PipelineError;

pub use sqs::SqsQueue;

/// One delivery of a queue message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Queue-assigned message id; stable across redeliveries.
    pub id: String,
    /// Raw message body (expected to be a JSON object).
    pub body: String,
    /// Token that acknowledges this delivery.
    pub delete_handle: DeleteHandle,
}

/// Receive/delete capability of a work queue.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Fetches up to `max_messages` messages. An empty vector means the
    /// queue had nothing visible.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Queue`] if the queue cannot be reached.
    async fn receive(&self, max_messages: i32) -> Result<Vec<QueueMessage>, PipelineError>;

    /// Acknowledges one delivery so the message is never redelivered.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Queue`] if the delete call fails; the
    /// message will then come back after its visibility timeout.
    async fn delete(&self, handle: &DeleteHandle) -> Result<(), PipelineError>;
}
