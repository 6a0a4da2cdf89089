use async_trait::async_trait;
use sqlx::Row;
use tracing::{instrument, Span};

use dresscode_catalog::{
    Category, Collection, NewProduct, Product, ProductFilter, Size, SizesUpdate, StockLevels,
};
use dresscode_core::{CategoryId, CollectionId, Page, ProductId, UserId};

use super::filter::{product_listing, product_search, select_products};
use super::{PgStore, map_rows, product_from_row, size_from_row};
use crate::error::map_sqlx_error;
use crate::repo::{CatalogRepository, MediaRepository, ReviewRepository};
use crate::{StoreError, StoreResult};

#[async_trait]
impl CatalogRepository for PgStore {
    #[instrument(skip(self, product), fields(name = %product.name, product_id = tracing::field::Empty), err)]
    async fn create_product(&self, product: &NewProduct) -> StoreResult<ProductId> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, description, price, collection_id, category, color)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.collection_id.map(CollectionId::get))
        .bind(&product.category)
        .bind(&product.color)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        if !product.sizes.is_empty() {
            let names: Vec<String> = product.sizes.iter().map(|s| s.name.clone()).collect();
            let amounts: Vec<i32> = product.sizes.iter().map(|s| s.amount).collect();
            sqlx::query(
                r#"
                INSERT INTO sizes (product_id, name, amount)
                SELECT $1, v.name, v.amount FROM UNNEST($2::text[], $3::int[]) AS v(name, amount)
                "#,
            )
            .bind(id)
            .bind(names)
            .bind(amounts)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_sizes", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("product_id", id);
        Ok(ProductId::new(id))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId, viewer: Option<UserId>) -> StoreResult<Product> {
        let mut qb = select_products(viewer);
        qb.push(" AND p.id = ").push_bind(id.get());
        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?
            .ok_or(StoreError::NotFound)?;
        let mut product = product_from_row(&row).map_err(|e| map_sqlx_error("get_product", e))?;

        product.sizes = self.product_sizes(id).await?;
        product.media = self.product_media(id).await?;
        product.rating = self.product_rating(id).await?;
        Ok(product)
    }

    #[instrument(skip(self, filter), fields(page = filter.page.number()), err)]
    async fn list_products(
        &self,
        filter: &ProductFilter,
        viewer: Option<UserId>,
    ) -> StoreResult<Vec<Product>> {
        let rows = product_listing(filter, viewer)
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        map_rows("list_products", rows, product_from_row)
    }

    #[instrument(skip(self), err)]
    async fn search_products(
        &self,
        query: &str,
        page: Page,
        viewer: Option<UserId>,
    ) -> StoreResult<Vec<Product>> {
        let rows = product_search(query, page, viewer)
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("search_products", e))?;
        map_rows("search_products", rows, product_from_row)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for table in ["products_in_cart", "liked_products", "media", "reviews", "sizes"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE product_id = $1"))
                .bind(id.get())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_product_dependents", e))?;
        }

        let deleted = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?
            .rows_affected();
        if deleted == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn product_sizes(&self, id: ProductId) -> StoreResult<Vec<Size>> {
        let rows = sqlx::query("SELECT id, product_id, name, amount FROM sizes WHERE product_id = $1 ORDER BY id")
            .bind(id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("product_sizes", e))?;
        map_rows("product_sizes", rows, size_from_row)
    }

    #[instrument(
        skip(self, update),
        fields(product_id = %id, removed = update.removed.len(), added = update.added.len()),
        err
    )]
    async fn update_sizes(&self, id: ProductId, update: &SizesUpdate) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Row lock on the product serializes concurrent size edits.
        sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_product", e))?
            .ok_or(StoreError::NotFound)?;

        if !update.removed.is_empty() {
            let ids: Vec<i64> = update.removed.iter().map(|s| s.get()).collect();
            let removed_names: Vec<String> =
                sqlx::query_scalar("DELETE FROM sizes WHERE product_id = $1 AND id = ANY($2) RETURNING name")
                    .bind(id.get())
                    .bind(ids)
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_sizes", e))?;

            sqlx::query("UPDATE products_in_cart SET existence = FALSE WHERE product_id = $1 AND size = ANY($2)")
                .bind(id.get())
                .bind(removed_names)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("flag_cart_entries", e))?;
        }

        if !update.added.is_empty() {
            let names: Vec<String> = update.added.iter().map(|s| s.name.clone()).collect();
            let amounts: Vec<i32> = update.added.iter().map(|s| s.amount).collect();
            sqlx::query(
                r#"
                INSERT INTO sizes (product_id, name, amount)
                SELECT $1, v.name, v.amount FROM UNNEST($2::text[], $3::int[]) AS v(name, amount)
                "#,
            )
            .bind(id.get())
            .bind(names)
            .bind(amounts)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_sizes", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self, levels), fields(sizes = levels.0.len()), err)]
    async fn set_stock_levels(&self, levels: &StockLevels) -> StoreResult<()> {
        if levels.is_empty() {
            return Ok(());
        }
        let (ids, amounts): (Vec<i64>, Vec<i32>) =
            levels.0.iter().map(|(id, amount)| (id.get(), *amount)).unzip();
        let expected = ids.len() as u64;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE sizes AS s SET amount = v.amount
            FROM UNNEST($1::bigint[], $2::int[]) AS v(id, amount)
            WHERE s.id = v.id
            "#,
        )
        .bind(ids)
        .bind(amounts)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("set_stock_levels", e))?
        .rows_affected();

        if updated != expected {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound);
        }
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), err)]
    async fn create_category(&self, name: &str) -> StoreResult<CategoryId> {
        let id: i64 = sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_category", e))?;
        Ok(CategoryId::new(id))
    }

    #[instrument(skip(self), err)]
    async fn categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("categories", e))?;
        map_rows("categories", rows, |row| {
            Ok(Category {
                id: CategoryId::new(row.try_get("id")?),
                name: row.try_get("name")?,
            })
        })
    }

    #[instrument(skip(self), err)]
    async fn create_collection(&self, name: &str) -> StoreResult<CollectionId> {
        let id: i64 = sqlx::query_scalar("INSERT INTO collections (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_collection", e))?;
        Ok(CollectionId::new(id))
    }

    #[instrument(skip(self), err)]
    async fn collections(&self) -> StoreResult<Vec<Collection>> {
        let rows = sqlx::query("SELECT id, name FROM collections ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("collections", e))?;
        map_rows("collections", rows, |row| {
            Ok(Collection {
                id: CollectionId::new(row.try_get("id")?),
                name: row.try_get("name")?,
            })
        })
    }
}
