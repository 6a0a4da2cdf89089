use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dresscode_core::{OrderId, ProductId, UserId};

use crate::{validate_basket, OrderError};

/// How the customer receives the order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Delivery,
    Pickup,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Delivery => "delivery",
            OrderType::Pickup => "pickup",
        }
    }
}

impl core::str::FromStr for OrderType {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivery" => Ok(OrderType::Delivery),
            "pickup" => Ok(OrderType::Pickup),
            other => Err(OrderError::validation(format!("unknown order type '{other}'"))),
        }
    }
}

/// Fulfilment status lifecycle.
///
/// Pickup orders go `created -> delivered_to_shop -> issued`; delivery orders
/// go `created -> sent_to_customer -> delivered_to_customer`. Staff may set any
/// status; the sequence is not enforced.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Created,
    DeliveredToShop,
    Issued,
    SentToCustomer,
    DeliveredToCustomer,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Created,
        OrderStatus::DeliveredToShop,
        OrderStatus::Issued,
        OrderStatus::SentToCustomer,
        OrderStatus::DeliveredToCustomer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Created => "created",
            OrderStatus::DeliveredToShop => "delivered_to_shop",
            OrderStatus::Issued => "issued",
            OrderStatus::SentToCustomer => "sent_to_customer",
            OrderStatus::DeliveredToCustomer => "delivered_to_customer",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::validation(format!("unknown order status '{s}'")))
    }
}

/// One basket line: product, size, quantity and the price and name the
/// customer saw when ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub size: String,
    #[serde(alias = "amount")]
    pub quantity: i32,
    /// Unit price in minor currency units.
    #[serde(alias = "price")]
    pub unit_price: i64,
    pub product_name: String,
}

impl OrderLine {
    pub fn total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

/// Order as submitted by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub shop_point: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub delivery_index: Option<i32>,
    #[serde(default)]
    pub delivery_price: i64,
    #[serde(alias = "ordered_products")]
    pub lines: Vec<OrderLine>,
}

/// A validated order ready for the placement transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub shop_point: Option<String>,
    pub payment_id: Option<String>,
    pub delivery_address: Option<String>,
    pub delivery_index: Option<i32>,
    pub delivery_price: i64,
    pub order_price: i64,
    pub lines: Vec<OrderLine>,
}

impl NewOrder {
    /// Validate `request` and compute its total.
    ///
    /// `order_price` is the sum of line totals plus the delivery price for
    /// delivery orders. Pickup orders carry no delivery price.
    pub fn from_request(user_id: UserId, request: OrderRequest) -> Result<Self, OrderError> {
        validate_basket(&request.lines)?;

        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        let delivery_price = match request.order_type {
            OrderType::Delivery => {
                if blank(&request.delivery_address) {
                    return Err(OrderError::validation("delivery orders need an address"));
                }
                if request.delivery_price < 0 {
                    return Err(OrderError::validation("delivery price cannot be negative"));
                }
                request.delivery_price
            }
            OrderType::Pickup => {
                if blank(&request.shop_point) {
                    return Err(OrderError::validation("pickup orders need a shop point"));
                }
                0
            }
        };

        let order_price = request
            .lines
            .iter()
            .try_fold(delivery_price, |acc, line| line.total()?.checked_add(acc))
            .ok_or_else(|| OrderError::validation("order total overflows"))?;

        Ok(Self {
            user_id,
            status: OrderStatus::Pending,
            order_type: request.order_type,
            shop_point: request.shop_point,
            payment_id: request.payment_id,
            delivery_address: request.delivery_address,
            delivery_index: request.delivery_index,
            delivery_price,
            order_price,
            lines: request.lines,
        })
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Filled in on single-order reads.
    #[serde(default)]
    pub user_email: Option<String>,
    pub status: OrderStatus,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub shop_point: Option<String>,
    pub payment_id: Option<String>,
    pub order_price: i64,
    pub delivery_id: Option<String>,
    pub pickup_id: Option<String>,
    pub delivery_price: i64,
    pub delivery_address: Option<String>,
    pub delivery_index: Option<i32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
}

impl Order {
    pub fn from_new(id: OrderId, new: NewOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            user_email: None,
            status: new.status,
            order_type: new.order_type,
            shop_point: new.shop_point,
            payment_id: new.payment_id,
            order_price: new.order_price,
            delivery_id: None,
            pickup_id: None,
            delivery_price: new.delivery_price,
            delivery_address: new.delivery_address,
            delivery_index: new.delivery_index,
            created_at,
            lines: new.lines,
        }
    }
}

/// Optional narrowing for order listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default, rename = "type")]
    pub order_type: Option<OrderType>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.status.is_none_or(|s| s == order.status)
            && self.order_type.is_none_or(|t| t == order.order_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(product: i64, size: &str, quantity: i32, unit_price: i64) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(product),
            size: size.to_string(),
            quantity,
            unit_price,
            product_name: "Dress".to_string(),
        }
    }

    fn delivery(lines: Vec<OrderLine>, delivery_price: i64) -> OrderRequest {
        OrderRequest {
            order_type: OrderType::Delivery,
            shop_point: None,
            payment_id: None,
            delivery_address: Some("1 Main St".to_string()),
            delivery_index: Some(101000),
            delivery_price,
            lines,
        }
    }

    #[test]
    fn delivery_total_includes_delivery_price() {
        let req = delivery(vec![line(1, "M", 2, 1_500), line(2, "L", 1, 700)], 300);
        let order = NewOrder::from_request(UserId::new(1), req).unwrap();
        assert_eq!(order.order_price, 2 * 1_500 + 700 + 300);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn pickup_ignores_delivery_price_and_needs_shop_point() {
        let mut req = delivery(vec![line(1, "M", 1, 1_000)], 500);
        req.order_type = OrderType::Pickup;
        assert!(NewOrder::from_request(UserId::new(1), req.clone()).is_err());

        req.shop_point = Some("Store #4".to_string());
        let order = NewOrder::from_request(UserId::new(1), req).unwrap();
        assert_eq!(order.order_price, 1_000);
        assert_eq!(order.delivery_price, 0);
    }

    #[test]
    fn delivery_without_address_is_rejected() {
        let mut req = delivery(vec![line(1, "M", 1, 1_000)], 0);
        req.delivery_address = Some("  ".to_string());
        assert!(matches!(
            NewOrder::from_request(UserId::new(1), req),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let req = delivery(vec![line(1, "M", i32::MAX, i64::MAX / 2)], 0);
        assert!(NewOrder::from_request(UserId::new(1), req).is_err());
    }

    #[test]
    fn statuses_round_trip_through_strings() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn request_accepts_legacy_field_names() {
        let json = r#"{
            "type": "pickup",
            "shop_point": "Mall",
            "ordered_products": [
                {"product_id": 3, "size": "S", "amount": 2, "price": 990, "product_name": "Skirt"}
            ]
        }"#;
        let req: OrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.lines[0].quantity, 2);
        assert_eq!(req.lines[0].unit_price, 990);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        #[test]
        fn total_is_sum_of_lines(
            items in proptest::collection::vec((1i32..20, 1i64..100_000), 1..30),
            delivery_price in 0i64..5_000,
        ) {
            let lines: Vec<_> = items
                .iter()
                .enumerate()
                .map(|(i, (q, p))| line(i as i64 + 1, "M", *q, *p))
                .collect();
            let expected: i64 = items.iter().map(|(q, p)| i64::from(*q) * p).sum::<i64>() + delivery_price;

            let order = NewOrder::from_request(UserId::new(1), delivery(lines, delivery_price)).unwrap();
            prop_assert_eq!(order.order_price, expected);
        }
    }
}
