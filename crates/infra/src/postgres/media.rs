use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::instrument;

use dresscode_catalog::{NewMedia, ProductMedia};
use dresscode_core::{MediaId, ProductId};

use super::{PgStore, map_rows, media_from_row};
use crate::error::map_sqlx_error;
use crate::repo::MediaRepository;
use crate::{StoreError, StoreResult};

async fn insert_media(
    conn: &mut PgConnection,
    product: ProductId,
    media: &NewMedia,
) -> StoreResult<MediaId> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO media (type, url, product_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(media.kind.as_str())
    .bind(&media.url)
    .bind(product.get())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_media", e))?;

    if media.sets_main_photo() {
        sqlx::query("UPDATE products SET main_photo_url = $2 WHERE id = $1")
            .bind(product.get())
            .bind(&media.url)
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("set_main_photo", e))?;
    }
    Ok(MediaId::new(id))
}

/// Clears `main_photo_url` on `product` if it is one of `urls`.
async fn clear_main_photo(
    conn: &mut PgConnection,
    product: i64,
    urls: Vec<String>,
) -> StoreResult<()> {
    sqlx::query("UPDATE products SET main_photo_url = NULL WHERE id = $1 AND main_photo_url = ANY($2)")
        .bind(product)
        .bind(urls)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("clear_main_photo", e))?;
    Ok(())
}

#[async_trait]
impl MediaRepository for PgStore {
    #[instrument(skip(self, media), fields(product_id = %product, kind = media.kind.as_str()), err)]
    async fn add_media(&self, product: ProductId, media: &NewMedia) -> StoreResult<MediaId> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        let id = insert_media(&mut tx, product, media).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(id)
    }

    #[instrument(skip(self), fields(media_id = %id), err)]
    async fn delete_media(&self, id: MediaId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let (product, url): (i64, String) =
            sqlx::query_as("DELETE FROM media WHERE id = $1 RETURNING product_id, url")
                .bind(id.get())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_media", e))?
                .ok_or(StoreError::NotFound)?;
        clear_main_photo(&mut tx, product, vec![url]).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(
        skip(self, removed, added),
        fields(product_id = %product, removed = removed.len(), added = added.len()),
        err
    )]
    async fn update_media(
        &self,
        product: ProductId,
        removed: &[MediaId],
        added: &[NewMedia],
    ) -> StoreResult<Vec<MediaId>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(product.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_product", e))?
            .ok_or(StoreError::NotFound)?;

        if !removed.is_empty() {
            let ids: Vec<i64> = removed.iter().map(|m| m.get()).collect();
            let urls: Vec<String> =
                sqlx::query_scalar("DELETE FROM media WHERE product_id = $1 AND id = ANY($2) RETURNING url")
                    .bind(product.get())
                    .bind(ids)
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_media", e))?;
            clear_main_photo(&mut tx, product.get(), urls).await?;
        }

        let mut ids = Vec::with_capacity(added.len());
        for media in added {
            ids.push(insert_media(&mut tx, product, media).await?);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(ids)
    }

    #[instrument(skip(self), fields(product_id = %product), err)]
    async fn product_media(&self, product: ProductId) -> StoreResult<Vec<ProductMedia>> {
        let rows = sqlx::query("SELECT id, product_id, type, url FROM media WHERE product_id = $1 ORDER BY id")
            .bind(product.get())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product_media", e))?;
        map_rows("product_media", rows, media_from_row)
    }
}
