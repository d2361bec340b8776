//! Database repository implementations

pub mod transaction_repository;

pub use transaction_repository::SeaOrmLedgerRepository;
