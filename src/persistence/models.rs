//! Database row models.

use chrono::NaiveDate;

/// One row of the login table, ready to insert.
///
/// `masked_ip` and `masked_device_id` hold base64 ciphertext, never the
/// raw values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRecord {
    /// Account identifier, copied verbatim.
    pub user_id: String,
    /// Device family (e.g. `"android"`), copied verbatim.
    pub device_type: String,
    /// Encrypted client IP.
    pub masked_ip: String,
    /// Encrypted device identifier.
    pub masked_device_id: String,
    /// Client locale, copied verbatim.
    pub locale: String,
    /// Collapsed app version; `0` when it could not be parsed.
    pub app_version: i32,
    /// Date the pipeline processed the event.
    pub create_date: NaiveDate,
}

impl LoginRecord {
    /// Column list in the order values are bound on insert.
    pub const COLUMNS: [&'static str; 7] = [
        "user_id",
        "device_type",
        "masked_ip",
        "masked_device_id",
        "locale",
        "app_version",
        "create_date",
    ];
}
