use core::str::FromStr;

use dresscode_core::DomainError;

use crate::app::errors::ServiceError;

/// Parse a path segment into a typed id.
///
/// Taking the segment as a `String` keeps bad ids on the JSON error path
/// instead of axum's plain-text rejection.
pub fn parse_id<T>(raw: &str) -> Result<T, ServiceError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ServiceError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dresscode_core::ProductId;

    #[test]
    fn bad_ids_are_validation_errors() {
        assert_eq!(parse_id::<ProductId>("12"), Ok(ProductId::new(12)));
        assert!(matches!(parse_id::<ProductId>("x"), Err(ServiceError::Validation(_))));
        assert!(matches!(parse_id::<ProductId>("0"), Err(ServiceError::Validation(_))));
    }
}
