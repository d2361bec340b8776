pub mod money;
pub mod report;
pub mod transaction;

// Re-export commonly used types
pub use money::Money;
pub use report::{
    aggregate, group_into_periods, Aggregate, DateRange, Period, PeriodRow, SlabCounts,
    UploadSummary,
};
pub use transaction::{ClearedBatch, LedgerRepository, TollTransaction};

// Re-export DomainError from support for convenience
pub use crate::support::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
