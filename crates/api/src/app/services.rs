//! Service layer: role checks and validation in front of the store.
//!
//! Handlers stay thin; every operation here takes the caller's
//! [`PrincipalContext`], authorizes it, validates input and then makes
//! exactly one repository call (the store runs it as one transaction).

use std::sync::Arc;

use chrono::{Duration, Utc};
use secrecy::ExposeSecret;

use dresscode_auth::{
    HashedPassword, Hs256Tokens, JwtValidator, NewUser, Permission, Role, TokenPair, User,
};
use dresscode_catalog::{
    validate_cart_amount, validate_name, CartItem, Category, Collection, NewMedia, NewProduct,
    Product, ProductFilter, ProductMedia, Review, ReviewInput, Size, SizesUpdate, StockLevels,
};
use dresscode_core::{
    CategoryId, CollectionId, MediaId, OrderId, Page, ProductId, ReviewId, UserId,
};
use dresscode_infra::config::{AdminConfig, JwtConfig};
use dresscode_infra::{InMemoryStore, Store, StoreError};
use dresscode_orders::{NewOrder, Order, OrderFilter, OrderRequest, OrderStatus, OrderType};

use crate::app::errors::ServiceError;
use crate::authz::{require_permission, resolve_principal};
use crate::context::PrincipalContext;

pub type ServiceResult<T> = Result<T, ServiceError>;

pub struct AppServices {
    store: Arc<dyn Store>,
    tokens: Arc<Hs256Tokens>,
}

/// Longest token lifetime honoured; larger configured values are clamped.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn ttl(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_TTL_SECS) as i64)
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, jwt: &JwtConfig) -> Self {
        let tokens = Hs256Tokens::new(
            jwt.secret.expose_secret().as_bytes(),
            ttl(jwt.access_ttl_secs),
            ttl(jwt.refresh_ttl_secs),
        );
        Self {
            store,
            tokens: Arc::new(tokens),
        }
    }

    /// Services over a fresh in-memory store.
    pub fn in_memory(jwt: &JwtConfig) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), jwt)
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn jwt_validator(&self) -> Arc<dyn JwtValidator> {
        self.tokens.clone()
    }

    // -------------------------
    // Accounts
    // -------------------------

    /// Create the configured admin account, or promote it if the email is
    /// already registered.
    pub async fn bootstrap_admin(&self, admin: &AdminConfig) -> ServiceResult<UserId> {
        let hash = HashedPassword::from_plain(admin.password.expose_secret())?;
        let user = NewUser::new(&admin.name, &admin.email, hash, Role::Admin)?;

        match self.store.create_user(&user).await {
            Ok(id) => {
                tracing::info!(user_id = %id, "created bootstrap admin");
                Ok(id)
            }
            Err(StoreError::Conflict(_)) => {
                let (existing, _) = self
                    .store
                    .find_credentials(&user.email)
                    .await?
                    .ok_or(ServiceError::NotFound)?;
                if existing.role != Role::Admin {
                    self.store.set_role(existing.id, Role::Admin).await?;
                }
                tracing::info!(user_id = %existing.id, "bootstrap admin already exists");
                Ok(existing.id)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> ServiceResult<UserId> {
        let hash = HashedPassword::from_plain(password)?;
        let user = NewUser::new(name, email, hash, Role::Customer)?;
        let id = self.store.create_user(&user).await?;
        tracing::info!(user_id = %id, "user signed up");
        Ok(id)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<TokenPair> {
        let email = email.trim().to_lowercase();
        let Some((user, hash)) = self.store.find_credentials(&email).await? else {
            return Err(ServiceError::Unauthenticated);
        };
        if !hash.verify(password) {
            return Err(ServiceError::Unauthenticated);
        }
        Ok(self.tokens.issue_pair(user.id, Utc::now())?)
    }

    pub fn refresh(&self, refresh_token: &str) -> ServiceResult<TokenPair> {
        Ok(self.tokens.refresh(refresh_token, Utc::now())?)
    }

    pub async fn change_role(
        &self,
        ctx: &PrincipalContext,
        target: UserId,
        role: Role,
    ) -> ServiceResult<()> {
        let actor =
            require_permission(self.store(), ctx, &Permission::USERS_MANAGE_ROLES).await?;
        self.store.set_role(target, role).await?;
        tracing::info!(actor = %actor.user_id, target_user = %target, role = %role, "role changed");
        Ok(())
    }

    /// Demote a buyer back to customer.
    pub async fn remove_buyer(&self, ctx: &PrincipalContext, target: UserId) -> ServiceResult<()> {
        require_permission(self.store(), ctx, &Permission::USERS_MANAGE_ROLES).await?;
        if self.store.user_role(target).await? != Role::Buyer {
            return Err(ServiceError::validation(format!("user {target} is not a buyer")));
        }
        self.store.set_role(target, Role::Customer).await?;
        Ok(())
    }

    pub async fn my_role(&self, ctx: &PrincipalContext) -> ServiceResult<Role> {
        Ok(resolve_principal(self.store(), ctx).await?.role)
    }

    pub async fn my_user(&self, ctx: &PrincipalContext) -> ServiceResult<User> {
        let user_id = ctx.require_user()?;
        match self.store.get_user(user_id).await {
            Err(StoreError::NotFound) => Err(ServiceError::Unauthenticated),
            other => Ok(other?),
        }
    }

    // -------------------------
    // Catalog
    // -------------------------

    pub async fn create_product(
        &self,
        ctx: &PrincipalContext,
        product: NewProduct,
    ) -> ServiceResult<ProductId> {
        require_permission(self.store(), ctx, &Permission::CATALOG_MANAGE).await?;
        product.validate()?;
        let id = self.store.create_product(&product).await?;
        tracing::info!(product_id = %id, sizes = product.sizes.len(), "product created");
        Ok(id)
    }

    pub async fn product(&self, ctx: &PrincipalContext, id: ProductId) -> ServiceResult<Product> {
        Ok(self.store.get_product(id, ctx.user_id()).await?)
    }

    pub async fn products(
        &self,
        ctx: &PrincipalContext,
        filter: ProductFilter,
    ) -> ServiceResult<Vec<Product>> {
        filter.validate()?;
        Ok(self.store.list_products(&filter, ctx.user_id()).await?)
    }

    pub async fn search(
        &self,
        ctx: &PrincipalContext,
        query: &str,
        page: Page,
    ) -> ServiceResult<Vec<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::validation("search query cannot be empty"));
        }
        Ok(self.store.search_products(query, page, ctx.user_id()).await?)
    }

    pub async fn delete_product(&self, ctx: &PrincipalContext, id: ProductId) -> ServiceResult<()> {
        require_permission(self.store(), ctx, &Permission::CATALOG_MANAGE).await?;
        self.store.delete_product(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn sizes(&self, id: ProductId) -> ServiceResult<Vec<Size>> {
        Ok(self.store.product_sizes(id).await?)
    }

    pub async fn update_sizes(
        &self,
        ctx: &PrincipalContext,
        id: ProductId,
        update: SizesUpdate,
    ) -> ServiceResult<()> {
        require_permission(self.store(), ctx, &Permission::CATALOG_MANAGE).await?;
        update.validate()?;
        if update.is_empty() {
            return Ok(());
        }
        Ok(self.store.update_sizes(id, &update).await?)
    }

    pub async fn set_stock_levels(
        &self,
        ctx: &PrincipalContext,
        levels: StockLevels,
    ) -> ServiceResult<()> {
        require_permission(self.store(), ctx, &Permission::CATALOG_MANAGE).await?;
        levels.validate()?;
        if levels.is_empty() {
            return Ok(());
        }
        Ok(self.store.set_stock_levels(&levels).await?)
    }

    pub async fn create_category(
        &self,
        ctx: &PrincipalContext,
        name: &str,
    ) -> ServiceResult<CategoryId> {
        require_permission(self.store(), ctx, &Permission::CATALOG_MANAGE).await?;
        validate_name("category", name)?;
        Ok(self.store.create_category(name.trim()).await?)
    }

    pub async fn categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.store.categories().await?)
    }

    pub async fn create_collection(
        &self,
        ctx: &PrincipalContext,
        name: &str,
    ) -> ServiceResult<CollectionId> {
        require_permission(self.store(), ctx, &Permission::CATALOG_MANAGE).await?;
        validate_name("collection", name)?;
        Ok(self.store.create_collection(name.trim()).await?)
    }

    pub async fn collections(&self) -> ServiceResult<Vec<Collection>> {
        Ok(self.store.collections().await?)
    }

    // -------------------------
    // Cart & wishlist
    // -------------------------

    pub async fn add_to_cart(
        &self,
        ctx: &PrincipalContext,
        product: ProductId,
        size: &str,
        amount: i32,
    ) -> ServiceResult<()> {
        let user = ctx.require_user()?;
        validate_name("size", size)?;
        validate_cart_amount(amount)?;
        Ok(self.store.add_to_cart(user, product, size, amount).await?)
    }

    pub async fn remove_from_cart(
        &self,
        ctx: &PrincipalContext,
        product: ProductId,
    ) -> ServiceResult<()> {
        let user = ctx.require_user()?;
        Ok(self.store.remove_from_cart(user, product).await?)
    }

    pub async fn cart(&self, ctx: &PrincipalContext) -> ServiceResult<Vec<CartItem>> {
        Ok(self.store.cart(ctx.require_user()?).await?)
    }

    pub async fn like(&self, ctx: &PrincipalContext, product: ProductId) -> ServiceResult<()> {
        Ok(self.store.like(ctx.require_user()?, product).await?)
    }

    pub async fn unlike(&self, ctx: &PrincipalContext, product: ProductId) -> ServiceResult<()> {
        Ok(self.store.unlike(ctx.require_user()?, product).await?)
    }

    pub async fn liked(&self, ctx: &PrincipalContext) -> ServiceResult<Vec<Product>> {
        Ok(self.store.liked(ctx.require_user()?).await?)
    }

    // -------------------------
    // Media
    // -------------------------

    pub async fn add_media(
        &self,
        ctx: &PrincipalContext,
        product: ProductId,
        media: NewMedia,
    ) -> ServiceResult<MediaId> {
        require_permission(self.store(), ctx, &Permission::CATALOG_MANAGE).await?;
        media.validate()?;
        Ok(self.store.add_media(product, &media).await?)
    }

    pub async fn delete_media(&self, ctx: &PrincipalContext, id: MediaId) -> ServiceResult<()> {
        require_permission(self.store(), ctx, &Permission::CATALOG_MANAGE).await?;
        Ok(self.store.delete_media(id).await?)
    }

    pub async fn update_media(
        &self,
        ctx: &PrincipalContext,
        product: ProductId,
        removed: Vec<MediaId>,
        added: Vec<NewMedia>,
    ) -> ServiceResult<Vec<MediaId>> {
        require_permission(self.store(), ctx, &Permission::CATALOG_MANAGE).await?;
        for media in &added {
            media.validate()?;
        }
        if added.iter().filter(|m| m.sets_main_photo()).count() > 1 {
            return Err(ServiceError::validation("at most one added photo can be the main photo"));
        }
        Ok(self.store.update_media(product, &removed, &added).await?)
    }

    pub async fn media(&self, product: ProductId) -> ServiceResult<Vec<ProductMedia>> {
        Ok(self.store.product_media(product).await?)
    }

    // -------------------------
    // Reviews
    // -------------------------

    pub async fn create_review(
        &self,
        ctx: &PrincipalContext,
        product: ProductId,
        input: ReviewInput,
    ) -> ServiceResult<ReviewId> {
        let author = ctx.require_user()?;
        input.validate()?;
        Ok(self.store.create_review(product, author, &input).await?)
    }

    pub async fn reviews(&self, product: ProductId) -> ServiceResult<Vec<Review>> {
        Ok(self.store.reviews(product).await?)
    }

    pub async fn update_review(
        &self,
        ctx: &PrincipalContext,
        id: ReviewId,
        input: ReviewInput,
    ) -> ServiceResult<()> {
        let user = ctx.require_user()?;
        input.validate()?;
        let review = self.store.get_review(id).await?;
        if review.user_id != user {
            return Err(ServiceError::Forbidden("only the author can edit a review".to_string()));
        }
        Ok(self.store.update_review(id, &input).await?)
    }

    pub async fn delete_review(&self, ctx: &PrincipalContext, id: ReviewId) -> ServiceResult<()> {
        let principal = resolve_principal(self.store(), ctx).await?;
        let review = self.store.get_review(id).await?;
        if !principal.owns_or_has(review.user_id, &Permission::REVIEWS_MODERATE) {
            return Err(ServiceError::Forbidden(
                "only the author or a moderator can delete a review".to_string(),
            ));
        }
        Ok(self.store.delete_review(id).await?)
    }

    pub async fn rating(&self, product: ProductId) -> ServiceResult<Option<f64>> {
        Ok(self.store.product_rating(product).await?)
    }

    // -------------------------
    // Orders
    // -------------------------

    pub async fn place_order(
        &self,
        ctx: &PrincipalContext,
        request: OrderRequest,
    ) -> ServiceResult<Order> {
        let user = ctx.require_user()?;
        let order = NewOrder::from_request(user, request)?;
        let lines = order.lines.len();

        match self.store.place_order(order).await {
            Ok(placed) => {
                tracing::info!(order_id = %placed.id, user_id = %user, lines, "order placed");
                Ok(placed)
            }
            Err(e) => {
                tracing::info!(user_id = %user, lines, error = %e, "order rejected");
                Err(e.into())
            }
        }
    }

    pub async fn my_orders(
        &self,
        ctx: &PrincipalContext,
        filter: OrderFilter,
    ) -> ServiceResult<Vec<Order>> {
        Ok(self.store.user_orders(ctx.require_user()?, &filter).await?)
    }

    /// Owners see their own orders; staff see every order.
    pub async fn order(&self, ctx: &PrincipalContext, id: OrderId) -> ServiceResult<Order> {
        let principal = resolve_principal(self.store(), ctx).await?;
        let order = self.store.get_order(id).await?;
        if !principal.owns_or_has(order.user_id, &Permission::ORDERS_READ_ALL) {
            return Err(ServiceError::Forbidden(format!("order {id} belongs to another user")));
        }
        Ok(order)
    }

    pub async fn orders_by_type(
        &self,
        ctx: &PrincipalContext,
        order_type: OrderType,
        status: Option<OrderStatus>,
    ) -> ServiceResult<Vec<Order>> {
        require_permission(self.store(), ctx, &Permission::ORDERS_READ_ALL).await?;
        Ok(self.store.orders_by_type(order_type, status).await?)
    }

    pub async fn set_status(
        &self,
        ctx: &PrincipalContext,
        id: OrderId,
        status: OrderStatus,
    ) -> ServiceResult<()> {
        let actor = require_permission(self.store(), ctx, &Permission::ORDERS_FULFIL).await?;
        self.store.set_status(id, status).await?;
        tracing::info!(order_id = %id, actor = %actor.user_id, %status, "order status changed");
        Ok(())
    }

    pub async fn set_delivery_id(
        &self,
        ctx: &PrincipalContext,
        id: OrderId,
        delivery_id: &str,
    ) -> ServiceResult<()> {
        require_permission(self.store(), ctx, &Permission::ORDERS_FULFIL).await?;
        validate_name("delivery_id", delivery_id)?;
        Ok(self.store.set_delivery_id(id, delivery_id.trim()).await?)
    }

    pub async fn set_pickup_id(
        &self,
        ctx: &PrincipalContext,
        id: OrderId,
        pickup_id: &str,
    ) -> ServiceResult<()> {
        require_permission(self.store(), ctx, &Permission::ORDERS_FULFIL).await?;
        validate_name("pickup_id", pickup_id)?;
        Ok(self.store.set_pickup_id(id, pickup_id.trim()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dresscode_catalog::NewSize;
    use dresscode_infra::AppConfig;
    use dresscode_orders::OrderLine;
    use secrecy::Secret;

    fn services() -> AppServices {
        AppServices::in_memory(&AppConfig::default_dev().jwt)
    }

    async fn admin(svc: &AppServices) -> PrincipalContext {
        let id = svc
            .bootstrap_admin(&AdminConfig {
                name: "Root".to_string(),
                email: "root@dresscode.test".to_string(),
                password: Secret::new("root-password".to_string()),
            })
            .await
            .unwrap();
        PrincipalContext::authenticated(id)
    }

    async fn customer(svc: &AppServices, email: &str) -> PrincipalContext {
        let id = svc.sign_up("Ann", email, "password123").await.unwrap();
        PrincipalContext::authenticated(id)
    }

    fn dress() -> NewProduct {
        NewProduct {
            name: "Summer dress".to_string(),
            description: String::new(),
            price: 5_000,
            collection_id: None,
            category: "dresses".to_string(),
            color: "blue".to_string(),
            sizes: vec![NewSize { name: "M".to_string(), amount: 2 }],
        }
    }

    #[tokio::test]
    async fn bootstrap_admin_is_idempotent() {
        let svc = services();
        let first = admin(&svc).await;
        let second = admin(&svc).await;
        assert_eq!(first, second);
        assert_eq!(svc.my_role(&first).await.unwrap(), Role::Admin);
    }

    #[tokio::test]
    async fn sign_in_checks_the_password() {
        let svc = services();
        customer(&svc, "ann@example.com").await;

        assert!(svc.sign_in("ANN@example.com", "password123").await.is_ok());
        assert_eq!(
            svc.sign_in("ann@example.com", "wrong-password").await,
            Err(ServiceError::Unauthenticated)
        );
        assert_eq!(
            svc.sign_in("nobody@example.com", "password123").await,
            Err(ServiceError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn customers_cannot_manage_the_catalog() {
        let svc = services();
        let ann = customer(&svc, "ann@example.com").await;
        assert!(matches!(
            svc.create_product(&ann, dress()).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert_eq!(
            svc.create_product(&PrincipalContext::anonymous(), dress()).await,
            Err(ServiceError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn role_is_read_from_the_store_on_every_check() {
        let svc = services();
        let root = admin(&svc).await;
        let bob = customer(&svc, "bob@example.com").await;
        let bob_id = bob.user_id().unwrap();

        svc.change_role(&root, bob_id, Role::Buyer).await.unwrap();
        assert!(svc.orders_by_type(&bob, OrderType::Pickup, None).await.is_ok());

        svc.remove_buyer(&root, bob_id).await.unwrap();
        assert!(matches!(
            svc.orders_by_type(&bob, OrderType::Pickup, None).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            svc.remove_buyer(&root, bob_id).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn orders_are_private_to_owner_and_staff() {
        let svc = services();
        let root = admin(&svc).await;
        let ann = customer(&svc, "ann@example.com").await;
        let eve = customer(&svc, "eve@example.com").await;
        let product = svc.create_product(&root, dress()).await.unwrap();

        let order = svc
            .place_order(
                &ann,
                OrderRequest {
                    order_type: OrderType::Pickup,
                    shop_point: Some("Main street".to_string()),
                    payment_id: None,
                    delivery_address: None,
                    delivery_index: None,
                    delivery_price: 0,
                    lines: vec![OrderLine {
                        product_id: product,
                        size: "M".to_string(),
                        quantity: 2,
                        unit_price: 5_000,
                        product_name: "Summer dress".to_string(),
                    }],
                },
            )
            .await
            .unwrap();

        assert_eq!(svc.order(&ann, order.id).await.unwrap().lines.len(), 1);
        assert!(svc.order(&root, order.id).await.is_ok());
        assert!(matches!(svc.order(&eve, order.id).await, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn only_the_author_edits_but_admin_may_delete() {
        let svc = services();
        let root = admin(&svc).await;
        let ann = customer(&svc, "ann@example.com").await;
        let product = svc.create_product(&root, dress()).await.unwrap();

        let review = svc
            .create_review(&ann, product, ReviewInput { rating: 4, comment: "nice".to_string() })
            .await
            .unwrap();
        let edit = ReviewInput { rating: 1, comment: String::new() };
        assert!(matches!(
            svc.update_review(&root, review, edit.clone()).await,
            Err(ServiceError::Forbidden(_))
        ));
        svc.update_review(&ann, review, edit).await.unwrap();
        assert_eq!(svc.rating(product).await.unwrap(), Some(1.0));

        svc.delete_review(&root, review).await.unwrap();
        assert_eq!(svc.rating(product).await.unwrap(), None);
    }
}
