use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dresscode_core::{DomainError, ProductId, ReviewId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Rating and comment as submitted for create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

impl ReviewInput {
    pub const MIN_RATING: i16 = 1;
    pub const MAX_RATING: i16 = 5;

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating) {
            return Err(DomainError::validation("rating must be between 1 and 5"));
        }
        if self.comment.chars().count() > 2000 {
            return Err(DomainError::validation("comment is too long"));
        }
        Ok(())
    }
}

/// Mean of `ratings`, or `None` when there are none.
pub fn average_rating(ratings: impl IntoIterator<Item = i16>) -> Option<f64> {
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0u32), |(sum, n), r| (sum + i64::from(r), n + 1));
    (count > 0).then(|| sum as f64 / f64::from(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn no_reviews_means_no_rating() {
        assert_eq!(average_rating([]), None);
        assert_eq!(average_rating([4, 5]), Some(4.5));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn only_one_to_five_is_accepted(rating in -10i16..20) {
            let input = ReviewInput { rating, comment: String::new() };
            prop_assert_eq!(input.validate().is_ok(), (1..=5).contains(&rating));
        }

        #[test]
        fn average_stays_within_bounds(ratings in proptest::collection::vec(1i16..=5, 1..50)) {
            let avg = average_rating(ratings).unwrap();
            prop_assert!((1.0..=5.0).contains(&avg));
        }
    }
}
