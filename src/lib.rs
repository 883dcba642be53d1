//! # login-pipeline
//!
//! Drains login events from an SQS queue, encrypts the PII fields, and
//! batch-inserts the rows into PostgreSQL.
//!
//! A message is deleted from the queue only after the transaction holding
//! its row has committed. Malformed messages and failed batches stay in the
//! queue and are redelivered once their visibility timeout expires.
//!
//! ## Architecture
//!
//! ```text
//! SQS queue (queue/)
//!     │  receive ≤ batch_size
//!     ▼
//! BatchPipeline (service/)
//!     ├── RawEvent → validation → LoginTransformer (domain/)
//!     │                              └── FieldCodec (crypto/)
//!     ├── Batch ──► LoginStore transaction (persistence/)
//!     │                 └── PostgreSQL
//!     └── commit ok ──► delete handles
//! ```

pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod queue;
pub mod service;
