//! Repository traits.
//!
//! Each trait covers one slice of the schema. Both [`crate::memory::InMemoryStore`]
//! and [`crate::postgres::PgStore`] implement all of them; the API layer holds
//! an `Arc<dyn Store>` and never knows which one it got.
//!
//! Every method is one short-lived unit of work. Methods that touch more than
//! one table run inside a single transaction.

use async_trait::async_trait;

use dresscode_auth::{HashedPassword, NewUser, Role, User};
use dresscode_catalog::{
    CartItem, Category, Collection, NewMedia, NewProduct, Product, ProductFilter, ProductMedia,
    Review, ReviewInput, Size, SizesUpdate, StockLevels,
};
use dresscode_core::{
    CategoryId, CollectionId, MediaId, OrderId, Page, ProductId, ReviewId, UserId,
};
use dresscode_orders::{NewOrder, Order, OrderError, OrderFilter, OrderStatus, OrderType};

use crate::StoreResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: &NewUser) -> StoreResult<UserId>;

    /// User and stored hash for sign-in; `None` for an unknown email.
    async fn find_credentials(&self, email: &str) -> StoreResult<Option<(User, HashedPassword)>>;

    async fn get_user(&self, id: UserId) -> StoreResult<User>;

    async fn user_role(&self, id: UserId) -> StoreResult<Role>;

    async fn set_role(&self, id: UserId, role: Role) -> StoreResult<()>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Inserts the product and its sizes together.
    async fn create_product(&self, product: &NewProduct) -> StoreResult<ProductId>;

    /// Fully enriched product: sizes, media, rating and `is_liked` for `viewer`.
    async fn get_product(&self, id: ProductId, viewer: Option<UserId>) -> StoreResult<Product>;

    async fn list_products(
        &self,
        filter: &ProductFilter,
        viewer: Option<UserId>,
    ) -> StoreResult<Vec<Product>>;

    /// Case-insensitive substring match on the product name.
    async fn search_products(
        &self,
        query: &str,
        page: Page,
        viewer: Option<UserId>,
    ) -> StoreResult<Vec<Product>>;

    /// Removes the product with its cart entries, likes, media, reviews and sizes.
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;

    async fn product_sizes(&self, id: ProductId) -> StoreResult<Vec<Size>>;

    /// Removes and adds sizes in one transaction. Cart lines that pointed at a
    /// removed size are kept but flagged `exists = false`.
    async fn update_sizes(&self, id: ProductId, update: &SizesUpdate) -> StoreResult<()>;

    /// Sets absolute amounts for many size rows in one statement.
    async fn set_stock_levels(&self, levels: &StockLevels) -> StoreResult<()>;

    async fn create_category(&self, name: &str) -> StoreResult<CategoryId>;

    async fn categories(&self) -> StoreResult<Vec<Category>>;

    async fn create_collection(&self, name: &str) -> StoreResult<CollectionId>;

    async fn collections(&self) -> StoreResult<Vec<Collection>>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn add_to_cart(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
        amount: i32,
    ) -> StoreResult<()>;

    async fn remove_from_cart(&self, user: UserId, product: ProductId) -> StoreResult<()>;

    async fn cart(&self, user: UserId) -> StoreResult<Vec<CartItem>>;

    /// Liking twice is a no-op.
    async fn like(&self, user: UserId, product: ProductId) -> StoreResult<()>;

    async fn unlike(&self, user: UserId, product: ProductId) -> StoreResult<()>;

    async fn liked(&self, user: UserId) -> StoreResult<Vec<Product>>;
}

#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// A main photo also becomes the product's `main_photo_url`.
    async fn add_media(&self, product: ProductId, media: &NewMedia) -> StoreResult<MediaId>;

    /// Clears the product's main photo when it pointed at the deleted url.
    async fn delete_media(&self, id: MediaId) -> StoreResult<()>;

    async fn update_media(
        &self,
        product: ProductId,
        removed: &[MediaId],
        added: &[NewMedia],
    ) -> StoreResult<Vec<MediaId>>;

    async fn product_media(&self, product: ProductId) -> StoreResult<Vec<ProductMedia>>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create_review(
        &self,
        product: ProductId,
        author: UserId,
        input: &ReviewInput,
    ) -> StoreResult<ReviewId>;

    /// Newest first.
    async fn reviews(&self, product: ProductId) -> StoreResult<Vec<Review>>;

    async fn get_review(&self, id: ReviewId) -> StoreResult<Review>;

    async fn update_review(&self, id: ReviewId, input: &ReviewInput) -> StoreResult<()>;

    async fn delete_review(&self, id: ReviewId) -> StoreResult<()>;

    async fn product_rating(&self, product: ProductId) -> StoreResult<Option<f64>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists the order and decrements stock for every line, or does
    /// nothing at all.
    ///
    /// Fails with [`OrderError::InsufficientStock`] when any line cannot be
    /// covered, without saying which.
    async fn place_order(&self, order: NewOrder) -> Result<Order, OrderError>;

    async fn user_orders(&self, user: UserId, filter: &OrderFilter) -> StoreResult<Vec<Order>>;

    /// Order with its lines and the owner's email.
    async fn get_order(&self, id: OrderId) -> StoreResult<Order>;

    async fn orders_by_type(
        &self,
        order_type: OrderType,
        status: Option<OrderStatus>,
    ) -> StoreResult<Vec<Order>>;

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()>;

    async fn set_delivery_id(&self, id: OrderId, delivery_id: &str) -> StoreResult<()>;

    async fn set_pickup_id(&self, id: OrderId, pickup_id: &str) -> StoreResult<()>;
}

/// Everything the API needs from storage.
pub trait Store:
    UserRepository
    + CatalogRepository
    + CartRepository
    + MediaRepository
    + ReviewRepository
    + OrderRepository
{
}

impl<T> Store for T where
    T: UserRepository
        + CatalogRepository
        + CartRepository
        + MediaRepository
        + ReviewRepository
        + OrderRepository
{
}
