use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;

use dresscode_catalog::{Review, ReviewInput};
use dresscode_core::{ProductId, ReviewId, UserId};

use super::{PgStore, map_rows};
use crate::error::map_sqlx_error;
use crate::repo::ReviewRepository;
use crate::{StoreError, StoreResult};

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.product_id, r.user_id, u.name AS user_name, r.rating, r.comment, r.created_at
    FROM reviews r
    JOIN users u ON u.id = r.user_id
"#;

fn review_from_row(row: &PgRow) -> Result<Review, sqlx::Error> {
    Ok(Review {
        id: ReviewId::new(row.try_get("id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        user_name: row.try_get("user_name")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ReviewRepository for PgStore {
    #[instrument(skip(self, input), fields(product_id = %product, user_id = %author), err)]
    async fn create_review(
        &self,
        product: ProductId,
        author: UserId,
        input: &ReviewInput,
    ) -> StoreResult<ReviewId> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO reviews (product_id, user_id, rating, comment) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(product.get())
        .bind(author.get())
        .bind(input.rating)
        .bind(&input.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_review", e))?;
        Ok(ReviewId::new(id))
    }

    #[instrument(skip(self), fields(product_id = %product), err)]
    async fn reviews(&self, product: ProductId) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query(&format!(
            "{REVIEW_SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(product.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("reviews", e))?;
        map_rows("reviews", rows, review_from_row)
    }

    #[instrument(skip(self), fields(review_id = %id), err)]
    async fn get_review(&self, id: ReviewId) -> StoreResult<Review> {
        let row = sqlx::query(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_review", e))?
            .ok_or(StoreError::NotFound)?;
        review_from_row(&row).map_err(|e| map_sqlx_error("get_review", e))
    }

    #[instrument(skip(self, input), fields(review_id = %id), err)]
    async fn update_review(&self, id: ReviewId, input: &ReviewInput) -> StoreResult<()> {
        let result = sqlx::query("UPDATE reviews SET rating = $2, comment = $3 WHERE id = $1")
            .bind(id.get())
            .bind(input.rating)
            .bind(&input.comment)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_review", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(review_id = %id), err)]
    async fn delete_review(&self, id: ReviewId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_review", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %product), err)]
    async fn product_rating(&self, product: ProductId) -> StoreResult<Option<f64>> {
        sqlx::query_scalar("SELECT AVG(rating)::float8 FROM reviews WHERE product_id = $1")
            .bind(product.get())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product_rating", e))
    }
}
