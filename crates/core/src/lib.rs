//! `dresscode-core`: shared domain building blocks.
//!
//! Pure types only: identifiers, the domain error model and paging. No IO.

pub mod error;
pub mod id;
pub mod page;

pub use error::DomainError;
pub use id::{
    CategoryId, CollectionId, MediaId, OrderId, ProductId, ReviewId, SizeId, UserId,
};
pub use page::Page;
