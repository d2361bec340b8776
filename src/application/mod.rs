//! Application layer: ingestion and reporting use-cases

pub mod ingestion;
pub mod reports;

pub use ingestion::{decode, DecodeError, IngestError, IngestService};
pub use reports::ReportService;
