//! Errors raised while building domain values from untrusted input.

use thiserror::Error;

/// A value was rejected before it reached storage.
///
/// Both variants surface as 400 at the HTTP edge. Missing rows and unique-key
/// clashes are storage outcomes and live in the infra error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field is out of range or malformed, e.g. a rating of 6 or a blank name.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A path or body identifier did not parse as a positive integer.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        assert_eq!(
            DomainError::validation("price must be positive").to_string(),
            "validation failed: price must be positive"
        );
        assert_eq!(
            DomainError::invalid_id("ProductId: must be positive").to_string(),
            "invalid identifier: ProductId: must be positive"
        );
    }
}
