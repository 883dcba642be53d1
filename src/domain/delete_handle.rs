//! Type-safe queue acknowledgment token.
//!
//! [`DeleteHandle`] is a newtype around the receipt string the queue hands
//! out with each delivery, so it cannot be confused with a message id or a
//! message body.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Token that acknowledges one delivery of a queue message.
///
/// A new handle is issued on every receive; only the handle from the
/// latest delivery is guaranteed to delete the message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeleteHandle(String);

impl DeleteHandle {
    /// Wraps a receipt string.
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Returns the raw receipt string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeleteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DeleteHandle {
    fn from(handle: String) -> Self {
        Self(handle)
    }
}

impl From<&str> for DeleteHandle {
    fn from(handle: &str) -> Self {
        Self(handle.to_string())
    }
}
