//! Decoded login-event message body.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::PipelineError;

/// Flat key → string view of one message body.
///
/// Only lives for the iteration that decoded it. Unknown keys are kept
/// and simply never read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvent {
    fields: HashMap<String, String>,
}

impl RawEvent {
    /// Decodes a JSON object body.
    ///
    /// String values are kept as-is; numbers and booleans are rendered to
    /// text. `null`, arrays and nested objects are dropped, so a required
    /// field holding one of them reads as absent.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedMessage`] if the body is not a
    /// JSON object.
    pub fn from_json(body: &str) -> Result<Self, PipelineError> {
        let object: serde_json::Map<String, Value> = serde_json::from_str(body)
            .map_err(|e| PipelineError::MalformedMessage(format!("body is not a JSON object: {e}")))?;

        let fields = object
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => return None,
                };
                Some((key, text))
            })
            .collect();

        Ok(Self { fields })
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Exact, case-sensitive key lookup.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of decoded fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the body decoded to an empty object.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawEvent
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
