//! Database entities module

pub mod transaction;

pub use transaction::Entity as Transaction;
