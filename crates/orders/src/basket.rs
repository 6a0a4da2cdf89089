use std::collections::HashSet;

use crate::{OrderError, OrderLine};

/// Upper bound on distinct lines in one order.
pub const MAX_BASKET_LINES: usize = 100;

/// Check a basket before it reaches storage.
///
/// Rejects an empty or oversized basket, non-positive quantities or prices,
/// and any (product, size) pair that appears twice. Duplicates are never
/// merged.
pub fn validate_basket(lines: &[OrderLine]) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::validation("order must contain at least one line"));
    }
    if lines.len() > MAX_BASKET_LINES {
        return Err(OrderError::validation(format!(
            "order cannot contain more than {MAX_BASKET_LINES} lines"
        )));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(OrderError::validation(format!(
                "quantity for product {} size {} must be positive",
                line.product_id, line.size
            )));
        }
        if line.unit_price < 0 {
            return Err(OrderError::validation("unit price cannot be negative"));
        }
        if line.size.trim().is_empty() {
            return Err(OrderError::validation("size cannot be empty"));
        }
        if !seen.insert((line.product_id, line.size.as_str())) {
            return Err(OrderError::DuplicateLine {
                product_id: line.product_id,
                size: line.size.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dresscode_core::ProductId;
    use proptest::prelude::*;

    fn line(product: i64, size: &str, quantity: i32) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(product),
            size: size.to_string(),
            quantity,
            unit_price: 1_000,
            product_name: format!("product {product}"),
        }
    }

    #[test]
    fn empty_basket_is_invalid() {
        assert!(matches!(validate_basket(&[]), Err(OrderError::Validation(_))));
    }

    #[test]
    fn same_product_and_size_twice_is_a_duplicate() {
        let err = validate_basket(&[line(1, "M", 3), line(1, "M", 2)]).unwrap_err();
        assert_eq!(
            err,
            OrderError::DuplicateLine {
                product_id: ProductId::new(1),
                size: "M".to_string()
            }
        );
    }

    #[test]
    fn same_product_in_two_sizes_is_fine() {
        assert_eq!(validate_basket(&[line(1, "M", 3), line(1, "L", 2)]), Ok(()));
    }

    #[test]
    fn zero_quantity_is_invalid() {
        assert!(matches!(
            validate_basket(&[line(1, "M", 0)]),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn oversized_basket_is_invalid() {
        let lines: Vec<_> = (1..=MAX_BASKET_LINES as i64 + 1).map(|p| line(p, "M", 1)).collect();
        assert!(validate_basket(&lines).is_err());
        assert!(validate_basket(&lines[..MAX_BASKET_LINES]).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        #[test]
        fn accepted_baskets_have_unique_pairs(
            raw in proptest::collection::vec((1i64..6, 0usize..3, 1i32..10), 1..20)
        ) {
            const SIZES: [&str; 3] = ["S", "M", "L"];
            let lines: Vec<_> = raw.iter().map(|(p, s, q)| line(*p, SIZES[*s], *q)).collect();

            let unique: HashSet<_> = lines.iter().map(|l| (l.product_id, l.size.clone())).collect();
            let result = validate_basket(&lines);

            if unique.len() == lines.len() {
                prop_assert_eq!(result, Ok(()));
            } else {
                let is_duplicate = matches!(result, Err(OrderError::DuplicateLine { .. }));
                prop_assert!(is_duplicate);
            }
        }
    }
}
