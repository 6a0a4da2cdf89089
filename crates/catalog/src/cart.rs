use serde::{Deserialize, Serialize};

use dresscode_core::{DomainError, ProductId};

/// A cart line as shown to its owner.
///
/// `exists` turns false when an admin removes the size the line refers to;
/// the line stays so the customer can see what disappeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub main_photo_url: Option<String>,
    pub price: i64,
    pub size: String,
    pub amount: i32,
    pub exists: bool,
}

pub fn validate_cart_amount(amount: i32) -> Result<(), DomainError> {
    if amount <= 0 {
        return Err(DomainError::validation("amount must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_must_be_positive() {
        assert!(validate_cart_amount(1).is_ok());
        assert!(validate_cart_amount(0).is_err());
        assert!(validate_cart_amount(-2).is_err());
    }
}
