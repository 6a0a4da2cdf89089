//! Infrastructure layer: configuration, repository traits and the two store
//! implementations (Postgres and in-memory).

pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repo;


pub use config::{AppConfig, ConfigError};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use postgres::PgStore;
pub use repo::{
    CartRepository, CatalogRepository, MediaRepository, OrderRepository, ReviewRepository, Store,
    UserRepository,
};
