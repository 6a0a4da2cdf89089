use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use dresscode_core::{CategoryId, CollectionId, DomainError, ProductId, SizeId};

use crate::ProductMedia;

/// A catalog product as returned to clients.
///
/// `is_liked`, `sizes`, `media` and `rating` are per-request enrichments and
/// are empty/false on listing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Price in minor currency units.
    pub price: i64,
    pub collection_id: Option<CollectionId>,
    pub collection_name: Option<String>,
    pub category: String,
    pub color: String,
    pub main_photo_url: Option<String>,
    pub is_liked: bool,
    #[serde(default)]
    pub media: Vec<ProductMedia>,
    #[serde(default)]
    pub sizes: Vec<Size>,
    pub rating: Option<f64>,
}

/// Stock row for one (product, size name) pair.
///
/// Invariant: `amount >= 0`. The store enforces it with a check constraint and
/// the order placement path only ever decrements conditionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub id: SizeId,
    pub product_id: ProductId,
    pub name: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSize {
    pub name: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
}

/// Input for product creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub collection_id: Option<CollectionId>,
    pub category: String,
    pub color: String,
    #[serde(default)]
    pub sizes: Vec<NewSize>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name("name", &self.name)?;
        validate_name("category", &self.category)?;
        validate_name("color", &self.color)?;
        if self.price <= 0 {
            return Err(DomainError::validation("price must be positive"));
        }
        validate_new_sizes(&self.sizes)
    }
}

/// Sizes to add to and remove from one product in a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizesUpdate {
    #[serde(default)]
    pub removed: Vec<SizeId>,
    #[serde(default)]
    pub added: Vec<NewSize>,
}

impl SizesUpdate {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_new_sizes(&self.added)
    }
}

/// Absolute stock levels to set, keyed by size row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockLevels(pub HashMap<SizeId, i32>);

impl StockLevels {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some((id, amount)) = self.0.iter().find(|(_, amount)| **amount < 0) {
            return Err(DomainError::validation(format!(
                "size {id}: amount cannot be negative (got {amount})"
            )));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn validate_name(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    if value.chars().count() > 255 {
        return Err(DomainError::validation(format!("{field} is too long")));
    }
    Ok(())
}

fn validate_new_sizes(sizes: &[NewSize]) -> Result<(), DomainError> {
    let mut seen = HashSet::new();
    for size in sizes {
        validate_name("size name", &size.name)?;
        if size.amount < 0 {
            return Err(DomainError::validation(format!(
                "size {}: amount cannot be negative",
                size.name
            )));
        }
        if !seen.insert(size.name.as_str()) {
            return Err(DomainError::validation(format!(
                "size {} listed twice",
                size.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shirt() -> NewProduct {
        NewProduct {
            name: "Linen shirt".to_string(),
            description: String::new(),
            price: 4_990,
            collection_id: None,
            category: "shirts".to_string(),
            color: "white".to_string(),
            sizes: vec![
                NewSize { name: "M".to_string(), amount: 5 },
                NewSize { name: "L".to_string(), amount: 0 },
            ],
        }
    }

    #[test]
    fn valid_product_passes() {
        assert_eq!(shirt().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_price() {
        let mut p = shirt();
        p.price = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_and_negative_sizes() {
        let mut p = shirt();
        p.sizes.push(NewSize { name: "M".to_string(), amount: 1 });
        assert!(p.validate().is_err());

        let mut p = shirt();
        p.sizes[0].amount = -1;
        assert!(p.validate().is_err());
    }

    #[test]
    fn stock_levels_reject_negative_amounts() {
        let mut levels = StockLevels::default();
        levels.0.insert(SizeId::new(1), 3);
        assert!(levels.validate().is_ok());
        levels.0.insert(SizeId::new(2), -1);
        assert!(levels.validate().is_err());
    }

    #[test]
    fn stock_levels_deserialize_from_json_object() {
        let levels: StockLevels = serde_json::from_str(r#"{"1": 4, "7": 0}"#).unwrap();
        assert_eq!(levels.0.get(&SizeId::new(1)), Some(&4));
        assert_eq!(levels.0.get(&SizeId::new(7)), Some(&0));
    }
}
