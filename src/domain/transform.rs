//! Shapes validated events into insertable rows.

use chrono::{Local, NaiveDate};

use super::RawEvent;
use super::validation::version_to_int;
use crate::crypto::FieldCodec;
use crate::error::PipelineError;
use crate::persistence::models::LoginRecord;

/// Turns a [`RawEvent`] into a [`LoginRecord`], encrypting PII on the way.
///
/// Holds the process-wide codec. Apart from [`LoginTransformer::transform_now`]
/// reading the clock, transformation does no I/O.
#[derive(Debug, Clone)]
pub struct LoginTransformer {
    codec: FieldCodec,
}

impl LoginTransformer {
    /// Creates a transformer around `codec`.
    #[must_use]
    pub const fn new(codec: FieldCodec) -> Self {
        Self { codec }
    }

    /// Returns the codec used for PII fields.
    #[must_use]
    pub const fn codec(&self) -> &FieldCodec {
        &self.codec
    }

    /// Builds a row stamped with `create_date`.
    ///
    /// `app_version` falls back to `"0"` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MalformedMessage`] if a copied or encrypted
    /// field is missing. Events that passed validation never hit this.
    pub fn transform(
        &self,
        event: &RawEvent,
        create_date: NaiveDate,
    ) -> Result<LoginRecord, PipelineError> {
        Ok(LoginRecord {
            user_id: required(event, "user_id")?.to_string(),
            device_type: required(event, "device_type")?.to_string(),
            masked_ip: self.codec.encrypt(required(event, "ip")?),
            masked_device_id: self.codec.encrypt(required(event, "device_id")?),
            locale: required(event, "locale")?.to_string(),
            app_version: version_to_int(Some(event.get("app_version").unwrap_or("0"))),
            create_date,
        })
    }

    /// Builds a row stamped with today's local date.
    ///
    /// # Errors
    ///
    /// Same as [`LoginTransformer::transform`].
    pub fn transform_now(&self, event: &RawEvent) -> Result<LoginRecord, PipelineError> {
        self.transform(event, Local::now().date_naive())
    }
}

fn required<'a>(event: &'a RawEvent, field: &str) -> Result<&'a str, PipelineError> {
    event
        .get(field)
        .ok_or_else(|| PipelineError::MalformedMessage(format!("missing required field {field}")))
}
