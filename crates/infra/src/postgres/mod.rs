//! Postgres-backed store.
//!
//! One [`PgStore`] implements every repository trait over a shared
//! connection pool. The schema lives in `migrations/` at the crate root and
//! is applied out of band.
//!
//! ## Transactions
//!
//! Multi-statement writes open a transaction with `pool.begin()`. Returning
//! early with `?` drops the transaction uncommitted, which rolls it back; this
//! also covers a request future that is cancelled mid-way.

mod cart;
mod catalog;
mod filter;
mod media;
mod orders;
mod reviews;
mod users;

use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use dresscode_catalog::{MediaKind, Product, ProductMedia, Size};
use dresscode_core::{CollectionId, MediaId, ProductId, SizeId};

use crate::StoreResult;
use crate::error::map_sqlx_error;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        tracing::info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a row selected with [`filter::PRODUCT_COLUMNS`] plus `is_liked`.
fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        collection_id: row
            .try_get::<Option<i64>, _>("collection_id")?
            .map(CollectionId::new),
        collection_name: row.try_get("collection_name")?,
        category: row.try_get("category")?,
        color: row.try_get("color")?,
        main_photo_url: row.try_get("main_photo_url")?,
        is_liked: row.try_get("is_liked")?,
        media: Vec::new(),
        sizes: Vec::new(),
        rating: None,
    })
}

fn size_from_row(row: &PgRow) -> Result<Size, sqlx::Error> {
    Ok(Size {
        id: SizeId::new(row.try_get("id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
        name: row.try_get("name")?,
        amount: row.try_get("amount")?,
    })
}

fn media_from_row(row: &PgRow) -> Result<ProductMedia, sqlx::Error> {
    let kind: String = row.try_get("type")?;
    Ok(ProductMedia {
        id: MediaId::new(row.try_get("id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
        kind: kind
            .parse::<MediaKind>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?,
        url: row.try_get("url")?,
    })
}

fn map_rows<T>(
    operation: &str,
    rows: Vec<PgRow>,
    f: impl Fn(&PgRow) -> Result<T, sqlx::Error>,
) -> StoreResult<Vec<T>> {
    rows.iter()
        .map(|row| f(row).map_err(|e| map_sqlx_error(operation, e)))
        .collect()
}
