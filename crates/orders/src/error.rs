use thiserror::Error;

use dresscode_core::{DomainError, ProductId};

/// Failure of order placement or order management.
///
/// `Validation` and `DuplicateLine` are raised before any storage call.
/// `InsufficientStock` means the whole basket was rolled back; it does not
/// say which line was short.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("duplicate line for product {product_id}, size {size}")]
    DuplicateLine { product_id: ProductId, size: String },

    #[error("insufficient stock for one or more lines")]
    InsufficientStock,

    #[error("order not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Storage(String),
}

impl OrderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                OrderError::Validation(msg)
            }
        }
    }
}
