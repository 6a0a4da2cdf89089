//! Storage error model.
//!
//! ## Postgres error mapping
//!
//! | SQLSTATE | meaning | `StoreError` |
//! |---|---|---|
//! | `23505` | unique violation | `Conflict` |
//! | `23503` | foreign key violation | `InvalidReference` |
//! | `23514` | check constraint violation | `Constraint` |
//! | other / transport | | `Backend` |

use thiserror::Error;

use dresscode_orders::OrderError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::InvalidReference(msg),
                Some("23514") => StoreError::Constraint(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => OrderError::NotFound,
            StoreError::Constraint(msg) | StoreError::InvalidReference(msg) => {
                OrderError::Validation(msg)
            }
            StoreError::Conflict(msg) | StoreError::Backend(msg) => OrderError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert_eq!(map_sqlx_error("get", sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn pool_closed_is_a_backend_failure() {
        assert!(matches!(
            map_sqlx_error("get", sqlx::Error::PoolClosed),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn store_errors_become_order_errors() {
        assert_eq!(OrderError::from(StoreError::NotFound), OrderError::NotFound);
        assert!(matches!(
            OrderError::from(StoreError::Backend("io".into())),
            OrderError::Storage(_)
        ));
    }
}
