//! Required-field checks and app-version classification.

use super::RawEvent;

/// Fields every login event must carry, in column-ish order.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "user_id",
    "device_id",
    "ip",
    "device_type",
    "locale",
    "app_version",
];

/// True iff every name in `required` is a key of `event`.
///
/// One missing field rejects the whole event.
#[must_use]
pub fn all_required_fields_present(event: &RawEvent, required: &[&str]) -> bool {
    required.iter().all(|field| event.contains_key(field))
}

/// Names from `required` that `event` lacks, in `required` order.
#[must_use]
pub fn missing_fields<'a>(event: &RawEvent, required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|field| !event.contains_key(field))
        .collect()
}

/// Collapses a dotted version into an integer: `"1.2.3"` becomes `123`.
///
/// Anything that is not digits once the dots are gone (empty, letters,
/// signs, whitespace, overflow, or no value at all) maps to `0` with a
/// warning. `0` therefore means "unknown", never a real version.
#[must_use]
pub fn version_to_int(version: Option<&str>) -> i32 {
    let Some(raw) = version else {
        tracing::warn!("app_version missing, defaulting to 0");
        return 0;
    };

    let digits: String = raw.chars().filter(|c| *c != '.').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        tracing::warn!(version = raw, "unparseable app_version, defaulting to 0");
        return 0;
    }

    digits.parse().unwrap_or_else(|_| {
        tracing::warn!(version = raw, "app_version overflows, defaulting to 0");
        0
    })
}
