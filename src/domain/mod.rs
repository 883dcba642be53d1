//! Domain layer: message decoding, validation, transformation and batching.
//!
//! Everything here is synchronous and free of I/O. The pipeline service
//! feeds queue messages through these types and hands the resulting
//! [`Batch`] to the store.

pub mod batch;
pub mod delete_handle;
pub mod raw_event;
pub mod transform;
pub mod validation;

pub use batch::Batch;
pub use delete_handle::DeleteHandle;
pub use raw_event::RawEvent;
pub use transform::LoginTransformer;
pub use validation::{REQUIRED_FIELDS, all_required_fields_present, missing_fields, version_to_int};
