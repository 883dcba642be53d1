//! Service layer: pipeline orchestration.
//!
//! [`BatchPipeline`] owns the queue and store handles for a run and makes
//! every retry/skip/commit/delete decision.

pub mod pipeline;

pub use pipeline::{BatchPipeline, RunReport};
