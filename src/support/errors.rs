use thiserror::Error;

/// Failure reported by a ledger repository.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Storage(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_errors_become_storage_errors() {
        let err: DomainError = sea_orm::DbErr::Custom("database is locked".into()).into();
        assert!(matches!(err, DomainError::Storage(_)));
        assert!(err.to_string().starts_with("Storage error: "));
        assert!(err.to_string().contains("database is locked"));
    }

    #[test]
    fn io_errors_convert() {
        let err: InfraError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "I/O error: gone");
    }
}
