//! Strongly-typed identifiers used across the domain.
//!
//! Every entity is keyed by a database-assigned serial number. The newtypes keep
//! a `ProductId` from being passed where a `SizeId` is expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! serial_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(i64);

        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                if value <= 0 {
                    return Err(DomainError::invalid_id(format!("{}: must be positive", $name)));
                }
                Ok(Self(value))
            }
        }
    };
}

serial_id!(
    /// Identifier of a registered user.
    UserId,
    "UserId"
);
serial_id!(
    /// Identifier of a catalog product.
    ProductId,
    "ProductId"
);
serial_id!(
    /// Identifier of a single (product, size) stock row.
    SizeId,
    "SizeId"
);
serial_id!(CategoryId, "CategoryId");
serial_id!(CollectionId, "CollectionId");
serial_id!(MediaId, "MediaId");
serial_id!(ReviewId, "ReviewId");
serial_id!(OrderId, "OrderId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_ids() {
        let id: ProductId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn rejects_zero_negative_and_garbage() {
        assert!("0".parse::<OrderId>().is_err());
        assert!("-3".parse::<OrderId>().is_err());
        assert!("abc".parse::<OrderId>().is_err());
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&UserId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UserId::new(7));
    }
}
