//! HTTP interface
//!
//! - `modules`: handlers grouped by feature (pages, uploads, analytics,
//!   settings, health, metrics)
//! - `common`: JSON envelope and validated extractor
//! - `router`: route table, shared state and OpenAPI document

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_router, ApiDoc, AppState};
