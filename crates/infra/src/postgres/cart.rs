use async_trait::async_trait;
use sqlx::Row;
use tracing::instrument;

use dresscode_catalog::{CartItem, Product};
use dresscode_core::{ProductId, UserId};

use super::filter::PRODUCT_COLUMNS;
use super::{PgStore, map_rows, product_from_row};
use crate::StoreResult;
use crate::error::map_sqlx_error;
use crate::repo::CartRepository;

#[async_trait]
impl CartRepository for PgStore {
    #[instrument(skip(self), fields(user_id = %user, product_id = %product), err)]
    async fn add_to_cart(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
        amount: i32,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO products_in_cart (user_id, product_id, size, amount) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.get())
        .bind(product.get())
        .bind(size)
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_to_cart", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user, product_id = %product), err)]
    async fn remove_from_cart(&self, user: UserId, product: ProductId) -> StoreResult<()> {
        sqlx::query("DELETE FROM products_in_cart WHERE user_id = $1 AND product_id = $2")
            .bind(user.get())
            .bind(product.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_from_cart", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user), err)]
    async fn cart(&self, user: UserId) -> StoreResult<Vec<CartItem>> {
        let rows = sqlx::query(
            r#"
            SELECT c.product_id, p.name AS product_name, p.main_photo_url, p.price,
                   c.size, c.amount, c.existence
            FROM products_in_cart c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(user.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("cart", e))?;

        map_rows("cart", rows, |row| {
            Ok(CartItem {
                product_id: ProductId::new(row.try_get("product_id")?),
                product_name: row.try_get("product_name")?,
                main_photo_url: row.try_get("main_photo_url")?,
                price: row.try_get("price")?,
                size: row.try_get("size")?,
                amount: row.try_get("amount")?,
                exists: row.try_get("existence")?,
            })
        })
    }

    #[instrument(skip(self), fields(user_id = %user, product_id = %product), err)]
    async fn like(&self, user: UserId, product: ProductId) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO liked_products (user_id, product_id) VALUES ($1, $2) ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(user.get())
        .bind(product.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("like", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user, product_id = %product), err)]
    async fn unlike(&self, user: UserId, product: ProductId) -> StoreResult<()> {
        sqlx::query("DELETE FROM liked_products WHERE user_id = $1 AND product_id = $2")
            .bind(user.get())
            .bind(product.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("unlike", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user), err)]
    async fn liked(&self, user: UserId) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}, TRUE AS is_liked
            FROM liked_products l
            JOIN products p ON p.id = l.product_id
            LEFT JOIN collections c ON c.id = p.collection_id
            WHERE l.user_id = $1
            ORDER BY l.id
            "#
        ))
        .bind(user.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("liked", e))?;
        map_rows("liked", rows, product_from_row)
    }
}
