//! Order domain module.
//!
//! Order and line types, basket validation and price totals. Everything here
//! runs before storage is touched; the atomic stock decrement itself lives in
//! the store implementations.

pub mod basket;
pub mod error;
pub mod order;

pub use basket::{validate_basket, MAX_BASKET_LINES};
pub use error::OrderError;
pub use order::{
    NewOrder, Order, OrderFilter, OrderLine, OrderRequest, OrderStatus, OrderType,
};
