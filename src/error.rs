//! Pipeline error taxonomy.
//!
//! [`PipelineError`] is the central error type. Each variant carries a
//! numeric code and a fatality classification so the batch loop and the
//! binary entry point agree on which failures end the run.

/// Errors raised while draining the queue into the store.
///
/// # Error Code Ranges
///
/// | Range     | Category   | Fatal |
/// |-----------|------------|-------|
/// | 1000–1999 | Message    | no    |
/// | 2000–2999 | Startup    | yes   |
/// | 3000–3999 | Collaborator I/O | queue: yes, store: no |
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Message body could not be decoded or lacks required fields.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Ciphertext could not be decoded back to plaintext.
    #[error("codec error: {0}")]
    Codec(String),

    /// Configuration value missing or out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// Queue service call failed.
    #[error("queue error: {0}")]
    Queue(String),

    /// Store call (begin, insert, commit, rollback, connect) failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl PipelineError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedMessage(_) => 1001,
            Self::Codec(_) => 1002,
            Self::Config(_) => 2001,
            Self::Persistence(_) => 3001,
            Self::Queue(_) => 3002,
        }
    }

    /// Whether the error must stop the pipeline.
    ///
    /// Message-level and batch-level failures are absorbed by the loop;
    /// a broken queue or a bad configuration leaves nothing to retry
    /// against.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Queue(_))
    }
}
