//! Catalog domain module.
//!
//! Products, their per-size stock rows, categories, collections, media
//! metadata, carts, wishlists and reviews. Validation lives here; storage
//! does not.

pub mod cart;
pub mod filter;
pub mod media;
pub mod product;
pub mod review;

pub use cart::{validate_cart_amount, CartItem};
pub use filter::{ProductFilter, PAGE_LIMIT};
pub use media::{MediaKind, NewMedia, ProductMedia};
pub use product::{
    Category, Collection, NewProduct, NewSize, Product, Size, SizesUpdate, StockLevels,
    validate_name,
};
pub use review::{average_rating, Review, ReviewInput};
