//! CSV ingestion
//!
//! The decoder turns a document into typed rows; the service persists them
//! and produces the upload summary.

pub mod decoder;
mod service;

pub use decoder::{decode, DecodeError, Records, REQUIRED_COLUMNS};
pub use service::{IngestError, IngestService};
