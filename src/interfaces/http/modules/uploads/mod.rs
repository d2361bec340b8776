//! Form endpoints that change the ledger

pub mod handlers;

pub use handlers::*;
