//! Typed persistence failures.

use thiserror::Error;

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for foreign_key_violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Operation not permitted for this requester")]
    Forbidden,

    #[error("Database unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("Database error: {0}")]
    Unknown(String),
}

impl DbError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(ref db_err) => match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    DbError::Conflict(db_err.constraint().unwrap_or("unique").to_string())
                }
                Some(FOREIGN_KEY_VIOLATION) => DbError::NotFound,
                _ => DbError::Unknown(err.to_string()),
            },
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => DbError::ConnectionUnavailable(err.to_string()),
            other => DbError::Unknown(other.to_string()),
        }
    }
}

/// Result alias used by every repository.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
    }

    #[test]
    fn test_pool_errors_map_to_unavailable() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::ConnectionUnavailable(_)
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::ConnectionUnavailable(_)
        ));
    }

    #[test]
    fn test_other_errors_map_to_unknown() {
        let err = DbError::from(sqlx::Error::ColumnNotFound("x".into()));
        assert!(matches!(err, DbError::Unknown(_)));
        assert!(!err.is_conflict());
    }
}
