//! Toll transaction aggregate
//!
//! Contains the transaction entity and the ledger repository interface.

pub mod model;
pub mod repository;

pub use model::{ClearedBatch, TollTransaction};
pub use repository::LedgerRepository;
