//! In-memory queue and store used by the pipeline tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use login_pipeline::domain::DeleteHandle;
use login_pipeline::error::PipelineError;
use login_pipeline::persistence::models::LoginRecord;
use login_pipeline::persistence::{LoginStore, StoreTransaction};
use login_pipeline::queue::{MessageQueue, QueueMessage};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered log of collaborator calls shared by the fakes.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.0).push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }
}

#[derive(Debug)]
struct StoredMessage {
    id: String,
    body: String,
    visible: bool,
    receive_count: u32,
}

#[derive(Debug, Default)]
struct QueueState {
    messages: Vec<StoredMessage>,
    fail_receive: bool,
    fail_delete_ids: HashSet<String>,
}

/// Queue with visibility semantics: a received message is hidden until
/// deleted or until [`InMemoryQueue::expire_visibility`] is called.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    state: Arc<Mutex<QueueState>>,
    journal: Journal,
}

impl InMemoryQueue {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            state: Arc::default(),
            journal,
        }
    }

    pub fn push(&self, id: &str, body: impl Into<String>) {
        lock(&self.state).messages.push(StoredMessage {
            id: id.to_string(),
            body: body.into(),
            visible: true,
            receive_count: 0,
        });
    }

    /// Simulates the visibility timeout elapsing for every in-flight message.
    pub fn expire_visibility(&self) {
        for message in &mut lock(&self.state).messages {
            message.visible = true;
        }
    }

    /// Ids of messages not yet deleted, visible or not.
    pub fn remaining_ids(&self) -> Vec<String> {
        lock(&self.state)
            .messages
            .iter()
            .map(|m| m.id.clone())
            .collect()
    }

    pub fn fail_receive(&self, fail: bool) {
        lock(&self.state).fail_receive = fail;
    }

    pub fn fail_delete_for(&self, id: &str) {
        lock(&self.state).fail_delete_ids.insert(id.to_string());
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn receive(&self, max_messages: i32) -> Result<Vec<QueueMessage>, PipelineError> {
        let mut state = lock(&self.state);
        if state.fail_receive {
            return Err(PipelineError::Queue("connection refused".to_string()));
        }
        let limit = usize::try_from(max_messages).unwrap_or(0);
        let received: Vec<QueueMessage> = state
            .messages
            .iter_mut()
            .filter(|m| m.visible)
            .take(limit)
            .map(|m| {
                m.visible = false;
                m.receive_count += 1;
                QueueMessage {
                    id: m.id.clone(),
                    body: m.body.clone(),
                    delete_handle: DeleteHandle::new(format!("{}#{}", m.id, m.receive_count)),
                }
            })
            .collect();
        drop(state);
        self.journal.record(format!("receive {}", received.len()));
        Ok(received)
    }

    async fn delete(&self, handle: &DeleteHandle) -> Result<(), PipelineError> {
        let mut state = lock(&self.state);
        let Some(position) = state
            .messages
            .iter()
            .position(|m| format!("{}#{}", m.id, m.receive_count) == handle.as_str())
        else {
            return Err(PipelineError::Queue(format!("stale handle {handle}")));
        };
        let id = state
            .messages
            .get(position)
            .map(|m| m.id.clone())
            .unwrap_or_default();
        if state.fail_delete_ids.contains(&id) {
            return Err(PipelineError::Queue(format!("delete rejected for {id}")));
        }
        state.messages.remove(position);
        drop(state);
        self.journal.record(format!("delete {id}"));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct StoreState {
    rows: Vec<(String, LoginRecord)>,
    failing_inserts: usize,
    failing_commits: usize,
    begins: usize,
    commits: usize,
    rollbacks: usize,
}

/// Store whose transactions stage rows until commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    journal: Journal,
}

impl InMemoryStore {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            state: Arc::default(),
            journal,
        }
    }

    /// Committed rows with the table they were inserted into.
    pub fn rows(&self) -> Vec<(String, LoginRecord)> {
        lock(&self.state).rows.clone()
    }

    /// Makes the next `count` inserts fail.
    pub fn fail_next_inserts(&self, count: usize) {
        lock(&self.state).failing_inserts = count;
    }

    /// Makes the next `count` commits fail.
    pub fn fail_next_commits(&self, count: usize) {
        lock(&self.state).failing_commits = count;
    }

    pub fn begins(&self) -> usize {
        lock(&self.state).begins
    }

    pub fn commits(&self) -> usize {
        lock(&self.state).commits
    }

    pub fn rollbacks(&self) -> usize {
        lock(&self.state).rollbacks
    }
}

#[async_trait]
impl LoginStore for InMemoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction, PipelineError> {
        lock(&self.state).begins += 1;
        self.journal.record("begin");
        Ok(InMemoryTransaction {
            state: Arc::clone(&self.state),
            journal: self.journal.clone(),
            staged: Vec::new(),
        })
    }
}

#[derive(Debug)]
pub struct InMemoryTransaction {
    state: Arc<Mutex<StoreState>>,
    journal: Journal,
    staged: Vec<(String, LoginRecord)>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn insert_batch(
        &mut self,
        table: &str,
        rows: &[LoginRecord],
    ) -> Result<u64, PipelineError> {
        {
            let mut state = lock(&self.state);
            if state.failing_inserts > 0 {
                state.failing_inserts -= 1;
                return Err(PipelineError::Persistence("deadlock detected".to_string()));
            }
        }
        self.staged
            .extend(rows.iter().map(|r| (table.to_string(), r.clone())));
        self.journal.record(format!("insert {}", rows.len()));
        Ok(rows.len() as u64)
    }

    async fn commit(self) -> Result<(), PipelineError> {
        let mut state = lock(&self.state);
        if state.failing_commits > 0 {
            state.failing_commits -= 1;
            return Err(PipelineError::Persistence("commit failed".to_string()));
        }
        state.rows.extend(self.staged);
        state.commits += 1;
        drop(state);
        self.journal.record("commit");
        Ok(())
    }

    async fn rollback(self) -> Result<(), PipelineError> {
        lock(&self.state).rollbacks += 1;
        self.journal.record("rollback");
        Ok(())
    }
}

/// A body carrying all six required fields.
pub fn login_body(user_id: &str, ip: &str, device_id: &str, app_version: &str) -> String {
    serde_json::json!({
        "user_id": user_id,
        "device_id": device_id,
        "ip": ip,
        "device_type": "android",
        "locale": "en_US",
        "app_version": app_version,
        "campaign": "spring",
    })
    .to_string()
}
