//! Orders, including the placement transactor.
//!
//! ## Placement
//!
//! The basket is re-validated first, so a duplicate (product, size) line is
//! rejected before any statement runs. Then one transaction:
//!
//! 1. insert the order header, returning its id
//! 2. insert every line with a single `INSERT .. SELECT FROM UNNEST`
//! 3. decrement stock with a single conditional `UPDATE .. FROM UNNEST`
//!    that only touches rows where `amount >= quantity`
//! 4. commit only if step 3 touched exactly one row per line
//!
//! Under read committed a concurrent placement that locked the same stock row
//! first makes step 3 re-check `amount >= quantity` against the committed
//! value, so two orders can never both take the last unit. Stock is never
//! read and then written from application code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use tracing::{instrument, Span};

use dresscode_core::{OrderId, ProductId, UserId};
use dresscode_orders::{
    NewOrder, Order, OrderError, OrderFilter, OrderLine, OrderStatus, OrderType, validate_basket,
};

use super::{PgStore, map_rows};
use crate::error::map_sqlx_error;
use crate::repo::OrderRepository;
use crate::{StoreError, StoreResult};

const DECREMENT_STOCK: &str = r#"
    UPDATE sizes AS s
    SET amount = s.amount - v.quantity
    FROM UNNEST($1::bigint[], $2::text[], $3::int[]) AS v(product_id, name, quantity)
    WHERE s.product_id = v.product_id
      AND s.name = v.name
      AND s.amount >= v.quantity
"#;

const INSERT_LINES: &str = r#"
    INSERT INTO ordered_products (order_id, product_id, size, amount, price, product_name)
    SELECT $1::bigint, v.product_id, v.size, v.amount, v.price, v.product_name
    FROM UNNEST($2::bigint[], $3::text[], $4::int[], $5::bigint[], $6::text[])
        AS v(product_id, size, amount, price, product_name)
"#;

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.status, o.type, o.shop_point, o.payment_id, \
     o.order_price, o.delivery_id, o.pickup_id, o.delivery_price, o.delivery_address, \
     o.delivery_index, o.created_at";

#[derive(Debug)]
struct OrderRow {
    id: i64,
    user_id: i64,
    status: String,
    order_type: String,
    shop_point: Option<String>,
    payment_id: Option<String>,
    order_price: i64,
    delivery_id: Option<String>,
    pickup_id: Option<String>,
    delivery_price: i64,
    delivery_address: Option<String>,
    delivery_index: Option<i32>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            status: row.try_get("status")?,
            order_type: row.try_get("type")?,
            shop_point: row.try_get("shop_point")?,
            payment_id: row.try_get("payment_id")?,
            order_price: row.try_get("order_price")?,
            delivery_id: row.try_get("delivery_id")?,
            pickup_id: row.try_get("pickup_id")?,
            delivery_price: row.try_get("delivery_price")?,
            delivery_address: row.try_get("delivery_address")?,
            delivery_index: row.try_get("delivery_index")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = sqlx::Error;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let decode = |e: OrderError| sqlx::Error::Decode(e.to_string().into());
        Ok(Order {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            user_email: None,
            status: row.status.parse().map_err(decode)?,
            order_type: row.order_type.parse().map_err(decode)?,
            shop_point: row.shop_point,
            payment_id: row.payment_id,
            order_price: row.order_price,
            delivery_id: row.delivery_id,
            pickup_id: row.pickup_id,
            delivery_price: row.delivery_price,
            delivery_address: row.delivery_address,
            delivery_index: row.delivery_index,
            created_at: row.created_at,
            lines: Vec::new(),
        })
    }
}

fn order_from_row(row: &PgRow) -> Result<Order, sqlx::Error> {
    OrderRow::from_row(row)?.try_into()
}

fn line_from_row(row: &PgRow) -> Result<OrderLine, sqlx::Error> {
    Ok(OrderLine {
        product_id: ProductId::new(row.try_get("product_id")?),
        size: row.try_get("size")?,
        quantity: row.try_get("amount")?,
        unit_price: row.try_get("price")?,
        product_name: row.try_get("product_name")?,
    })
}

impl PgStore {
    async fn update_order_field(
        &self,
        operation: &str,
        sql: &str,
        id: OrderId,
        value: &str,
    ) -> StoreResult<()> {
        let result = sqlx::query(sql)
            .bind(id.get())
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    #[instrument(
        skip(self, order),
        fields(
            user_id = %order.user_id,
            lines = order.lines.len(),
            order_id = tracing::field::Empty
        ),
        err
    )]
    async fn place_order(&self, order: NewOrder) -> Result<Order, OrderError> {
        validate_basket(&order.lines)?;
        let line_count = order.lines.len();
        let product_ids: Vec<i64> = order.lines.iter().map(|l| l.product_id.get()).collect();
        let sizes: Vec<String> = order.lines.iter().map(|l| l.size.clone()).collect();
        let quantities: Vec<i32> = order.lines.iter().map(|l| l.quantity).collect();
        let prices: Vec<i64> = order.lines.iter().map(|l| l.unit_price).collect();
        let names: Vec<String> = order.lines.iter().map(|l| l.product_name.clone()).collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO orders (
                user_id, status, type, shop_point, payment_id, order_price,
                delivery_address, delivery_index, delivery_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_at
            "#,
        )
        .bind(order.user_id.get())
        .bind(order.status.as_str())
        .bind(order.order_type.as_str())
        .bind(order.shop_point.as_deref())
        .bind(order.payment_id.as_deref())
        .bind(order.order_price)
        .bind(order.delivery_address.as_deref())
        .bind(order.delivery_index)
        .bind(order.delivery_price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        sqlx::query(INSERT_LINES)
            .bind(id)
            .bind(product_ids.clone())
            .bind(sizes.clone())
            .bind(quantities.clone())
            .bind(prices)
            .bind(names)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_lines", e))?;

        let decremented = sqlx::query(DECREMENT_STOCK)
            .bind(product_ids)
            .bind(sizes)
            .bind(quantities)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("decrement_stock", e))?
            .rows_affected();

        if decremented != line_count as u64 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            tracing::warn!(
                expected = line_count,
                decremented,
                "insufficient stock, order rolled back"
            );
            return Err(OrderError::InsufficientStock);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("order_id", id);
        tracing::info!(order_price = order.order_price, "order placed");
        Ok(Order::from_new(OrderId::new(id), order, created_at))
    }

    #[instrument(skip(self, filter), fields(user_id = %user), err)]
    async fn user_orders(&self, user: UserId, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders o
            WHERE o.user_id = $1
              AND ($2::text IS NULL OR o.status = $2)
              AND ($3::text IS NULL OR o.type = $3)
            ORDER BY o.id DESC
            "#
        ))
        .bind(user.get())
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.order_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_orders", e))?;
        map_rows("user_orders", rows, order_from_row)
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS}, u.email AS user_email FROM orders o JOIN users u ON u.id = o.user_id WHERE o.id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order", e))?
        .ok_or(StoreError::NotFound)?;

        let mut order = order_from_row(&row).map_err(|e| map_sqlx_error("get_order", e))?;
        order.user_email = row
            .try_get("user_email")
            .map_err(|e| map_sqlx_error("get_order", e))?;

        let lines = sqlx::query(
            "SELECT product_id, size, amount, price, product_name FROM ordered_products WHERE order_id = $1 ORDER BY id",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_order_lines", e))?;
        order.lines = map_rows("get_order_lines", lines, line_from_row)?;
        Ok(order)
    }

    #[instrument(skip(self), fields(order_type = order_type.as_str()), err)]
    async fn orders_by_type(
        &self,
        order_type: OrderType,
        status: Option<OrderStatus>,
    ) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders o
            WHERE o.type = $1 AND ($2::text IS NULL OR o.status = $2)
            ORDER BY o.id
            "#
        ))
        .bind(order_type.as_str())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_by_type", e))?;
        map_rows("orders_by_type", rows, order_from_row)
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status), err)]
    async fn set_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()> {
        self.update_order_field(
            "set_order_status",
            "UPDATE orders SET status = $2 WHERE id = $1",
            id,
            status.as_str(),
        )
        .await
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn set_delivery_id(&self, id: OrderId, delivery_id: &str) -> StoreResult<()> {
        self.update_order_field(
            "set_delivery_id",
            "UPDATE orders SET delivery_id = $2 WHERE id = $1",
            id,
            delivery_id,
        )
        .await
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn set_pickup_id(&self, id: OrderId, pickup_id: &str) -> StoreResult<()> {
        self.update_order_field(
            "set_pickup_id",
            "UPDATE orders SET pickup_id = $2 WHERE id = $1",
            id,
            pickup_id,
        )
        .await
    }
}
