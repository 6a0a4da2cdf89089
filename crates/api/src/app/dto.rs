use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use dresscode_catalog::{NewMedia, NewSize, ProductFilter, SizesUpdate, StockLevels};
use dresscode_core::{CollectionId, MediaId, Page, ProductId, SizeId, UserId};
use dresscode_orders::OrderStatus;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// `GET /api/products` query string. Lists are comma separated
/// (`colors=red,black`).
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub collection_id: Option<CollectionId>,
    pub category: Option<String>,
    pub colors: Option<String>,
    pub sizes: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub page: Option<u32>,
}

impl ProductsQuery {
    pub fn into_filter(self) -> ProductFilter {
        ProductFilter {
            collection_id: self.collection_id,
            category: self.category.filter(|c| !c.trim().is_empty()),
            colors: split_list(self.colors.as_deref()),
            sizes: split_list(self.sizes.as_deref()),
            min_price: self.min_price,
            max_price: self.max_price,
            page: Page::new(self.page.unwrap_or(1)),
        }
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(alias = "query")]
    pub q: String,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSizesRequest {
    #[serde(default)]
    pub removed_sizes: Vec<SizeId>,
    #[serde(default)]
    pub added_sizes: Vec<NewSize>,
}

impl From<UpdateSizesRequest> for SizesUpdate {
    fn from(req: UpdateSizesRequest) -> Self {
        SizesUpdate {
            removed: req.removed_sizes,
            added: req.added_sizes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SizeAmount {
    pub size_id: SizeId,
    pub amount: i32,
}

#[derive(Debug, Deserialize)]
pub struct StockLevelsRequest {
    pub sizes: Vec<SizeAmount>,
}

impl StockLevelsRequest {
    /// Later entries for the same size win.
    pub fn into_levels(self) -> StockLevels {
        let levels: HashMap<SizeId, i32> = self
            .sizes
            .into_iter()
            .map(|s| (s.size_id, s.amount))
            .collect();
        StockLevels(levels)
    }
}

#[derive(Debug, Deserialize)]
pub struct CartRequest {
    pub size: String,
    pub amount: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMediaRequest {
    #[serde(default)]
    pub removed: Vec<MediaId>,
    #[serde(default)]
    pub added: Vec<NewMedia>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: ProductId,
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct SetDeliveryIdRequest {
    pub delivery_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPickupIdRequest {
    pub pickup_id: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct IdResponse<T> {
    pub id: T,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_lists_become_filter_sets() {
        let q = ProductsQuery {
            colors: Some("red, black,,".to_string()),
            sizes: Some("M".to_string()),
            page: Some(0),
            ..Default::default()
        };
        let filter = q.into_filter();
        assert_eq!(filter.colors, vec!["red".to_string(), "black".to_string()]);
        assert_eq!(filter.sizes, vec!["M".to_string()]);
        assert_eq!(filter.page, Page::FIRST);
    }

    #[test]
    fn stock_levels_request_accepts_size_id_pairs() {
        let req: StockLevelsRequest = serde_json::from_str(
            r#"{"sizes": [{"size_id": 3, "amount": 7}, {"size_id": 4, "amount": 0}]}"#,
        )
        .unwrap();
        let levels = req.into_levels();
        assert_eq!(levels.0.get(&SizeId::new(3)), Some(&7));
        assert_eq!(levels.0.get(&SizeId::new(4)), Some(&0));
    }

    #[test]
    fn sizes_update_uses_wire_names() {
        let req: UpdateSizesRequest = serde_json::from_str(
            r#"{"removed_sizes": [1], "added_sizes": [{"name": "XL", "amount": 2}]}"#,
        )
        .unwrap();
        let update = SizesUpdate::from(req);
        assert_eq!(update.removed, vec![SizeId::new(1)]);
        assert_eq!(update.added[0].name, "XL");
    }
}
