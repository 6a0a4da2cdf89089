//! Product listing filters.
//!
//! The Postgres store turns a [`ProductFilter`] into a dynamic `WHERE`
//! clause; the in-memory store evaluates [`ProductFilter::matches`] directly.
//! Both must agree on semantics:
//!
//! - every set field narrows the result (AND)
//! - `colors` and `sizes` match any of the listed values (OR within the field)
//! - a size only counts while it still has stock (`amount > 0`)
//! - price bounds are inclusive

use serde::{Deserialize, Serialize};

use dresscode_core::{CollectionId, DomainError, Page};

use crate::{Product, Size};

/// Fixed page size for product listings.
pub const PAGE_LIMIT: u32 = 21;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub collection_id: Option<CollectionId>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub min_price: Option<i64>,
    #[serde(default)]
    pub max_price: Option<i64>,
    #[serde(default)]
    pub page: Page,
}

impl ProductFilter {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(DomainError::validation("min_price is greater than max_price"));
            }
        }
        if self.min_price.is_some_and(|p| p < 0) || self.max_price.is_some_and(|p| p < 0) {
            return Err(DomainError::validation("price bounds cannot be negative"));
        }
        Ok(())
    }

    pub fn offset(&self) -> u64 {
        self.page.offset(PAGE_LIMIT)
    }

    /// Whether `product`, with its stock rows `sizes`, passes this filter.
    /// Paging is not applied here.
    pub fn matches(&self, product: &Product, sizes: &[Size]) -> bool {
        if let Some(collection) = self.collection_id {
            if product.collection_id != Some(collection) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if !self.colors.is_empty() && !self.colors.iter().any(|c| *c == product.color) {
            return false;
        }
        if !self.sizes.is_empty() {
            let in_stock = sizes
                .iter()
                .filter(|s| s.product_id == product.id && s.amount > 0)
                .any(|s| self.sizes.contains(&s.name));
            if !in_stock {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dresscode_core::{ProductId, SizeId};
    use proptest::prelude::*;

    fn product(price: i64, color: &str) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Coat".to_string(),
            description: String::new(),
            price,
            collection_id: Some(CollectionId::new(2)),
            collection_name: None,
            category: "outerwear".to_string(),
            color: color.to_string(),
            main_photo_url: None,
            is_liked: false,
            media: Vec::new(),
            sizes: Vec::new(),
            rating: None,
        }
    }

    fn size(name: &str, amount: i32) -> Size {
        Size {
            id: SizeId::new(1),
            product_id: ProductId::new(1),
            name: name.to_string(),
            amount,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(ProductFilter::default().matches(&product(100, "red"), &[]));
    }

    #[test]
    fn colors_match_any_of() {
        let filter = ProductFilter {
            colors: vec!["black".to_string(), "red".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&product(100, "red"), &[]));
        assert!(!filter.matches(&product(100, "blue"), &[]));
    }

    #[test]
    fn sold_out_sizes_do_not_match() {
        let filter = ProductFilter {
            sizes: vec!["M".to_string()],
            ..Default::default()
        };
        let p = product(100, "red");
        assert!(filter.matches(&p, &[size("M", 1)]));
        assert!(!filter.matches(&p, &[size("M", 0)]));
        assert!(!filter.matches(&p, &[size("L", 4)]));
    }

    #[test]
    fn collection_and_category_narrow() {
        let mut filter = ProductFilter {
            collection_id: Some(CollectionId::new(2)),
            category: Some("outerwear".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&product(100, "red"), &[]));
        filter.collection_id = Some(CollectionId::new(3));
        assert!(!filter.matches(&product(100, "red"), &[]));
    }

    #[test]
    fn inverted_price_range_is_invalid() {
        let filter = ProductFilter {
            min_price: Some(500),
            max_price: Some(100),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn second_page_starts_after_one_full_page() {
        let filter = ProductFilter {
            page: Page::new(2),
            ..Default::default()
        };
        assert_eq!(filter.offset(), u64::from(PAGE_LIMIT));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn price_bounds_are_inclusive(price in 0i64..100_000, lo in 0i64..100_000, hi in 0i64..100_000) {
            let filter = ProductFilter { min_price: Some(lo), max_price: Some(hi), ..Default::default() };
            let expected = lo <= price && price <= hi;
            prop_assert_eq!(filter.matches(&product(price, "red"), &[]), expected);
        }
    }
}
