//! Amazon SQS implementation of the queue layer.
//!
//! Works against AWS or any SQS-compatible endpoint (LocalStack,
//! ElasticMQ) configured through `QUEUE_ENDPOINT_URL`. Credentials come
//! from the default AWS provider chain.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::config::Region;

use super::{MessageQueue, QueueMessage};
use crate::config::PipelineConfig;
use crate::domain::DeleteHandle;
use crate::error::PipelineError;

/// SQS-backed [`MessageQueue`].
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
    visibility_timeout_secs: Option<i32>,
    wait_time_secs: i32,
}

impl SqsQueue {
    /// Wraps an existing client.
    #[must_use]
    pub fn new(
        client: Client,
        queue_url: impl Into<String>,
        visibility_timeout_secs: Option<i32>,
        wait_time_secs: i32,
    ) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            visibility_timeout_secs,
            wait_time_secs,
        }
    }

    /// Builds a client from `config` and the default credential chain.
    pub async fn connect(config: &PipelineConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.queue_endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Self::new(
            Client::new(&sdk_config),
            config.queue_url.clone(),
            config.visibility_timeout_secs,
            config.wait_time_secs,
        )
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive(&self, max_messages: i32) -> Result<Vec<QueueMessage>, PipelineError> {
        let mut request = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(self.wait_time_secs);
        if let Some(timeout) = self.visibility_timeout_secs {
            request = request.visibility_timeout(timeout);
        }

        let output = request
            .send()
            .await
            .map_err(|e| PipelineError::Queue(format!("receive failed: {e}")))?;

        let messages = output
            .messages()
            .iter()
            .filter_map(|message| {
                let id = message.message_id().unwrap_or("unknown").to_string();
                let Some(handle) = message.receipt_handle() else {
                    tracing::warn!(message_id = %id, "message without receipt handle, ignoring");
                    return None;
                };
                Some(QueueMessage {
                    id,
                    body: message.body().unwrap_or_default().to_string(),
                    delete_handle: DeleteHandle::new(handle),
                })
            })
            .collect();

        Ok(messages)
    }

    async fn delete(&self, handle: &DeleteHandle) -> Result<(), PipelineError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(handle.as_str())
            .send()
            .await
            .map_err(|e| PipelineError::Queue(format!("delete failed: {e}")))?;

        Ok(())
    }
}
