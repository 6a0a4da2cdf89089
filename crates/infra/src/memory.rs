//! In-memory store.
//!
//! Intended for tests and local development. All tables live behind one
//! `RwLock`, so every write method is trivially atomic: it validates with the
//! lock held and only then mutates.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use dresscode_auth::{HashedPassword, NewUser, Role, User};
use dresscode_catalog::{
    CartItem, Category, Collection, NewMedia, NewProduct, PAGE_LIMIT, Product, ProductFilter,
    ProductMedia, Review, ReviewInput, Size, SizesUpdate, StockLevels, average_rating,
};
use dresscode_core::{
    CategoryId, CollectionId, MediaId, OrderId, Page, ProductId, ReviewId, SizeId, UserId,
};
use dresscode_orders::{
    NewOrder, Order, OrderError, OrderFilter, OrderStatus, OrderType, validate_basket,
};

use crate::repo::{
    CartRepository, CatalogRepository, MediaRepository, OrderRepository, ReviewRepository,
    UserRepository,
};
use crate::{StoreError, StoreResult};

#[derive(Debug)]
struct UserRow {
    user: User,
    password_hash: HashedPassword,
}

#[derive(Debug, Clone)]
struct CartRow {
    user_id: UserId,
    product_id: ProductId,
    size: String,
    amount: i32,
    exists: bool,
}

#[derive(Debug, Default)]
struct State {
    last_id: i64,
    users: BTreeMap<UserId, UserRow>,
    categories: BTreeMap<CategoryId, Category>,
    collections: BTreeMap<CollectionId, Collection>,
    /// Stored bare: enrichment fields are filled in on read.
    products: BTreeMap<ProductId, Product>,
    sizes: BTreeMap<SizeId, Size>,
    media: BTreeMap<MediaId, ProductMedia>,
    liked: BTreeSet<(UserId, ProductId)>,
    cart: Vec<CartRow>,
    reviews: BTreeMap<ReviewId, Review>,
    orders: BTreeMap<OrderId, Order>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn ensure_product(&self, id: ProductId) -> StoreResult<&Product> {
        self.products
            .get(&id)
            .ok_or_else(|| StoreError::InvalidReference(format!("product {id} does not exist")))
    }

    fn sizes_of(&self, product: ProductId) -> Vec<Size> {
        self.sizes
            .values()
            .filter(|s| s.product_id == product)
            .cloned()
            .collect()
    }

    fn summary(&self, product: &Product, viewer: Option<UserId>) -> Product {
        let mut p = product.clone();
        p.collection_name = p
            .collection_id
            .and_then(|c| self.collections.get(&c))
            .map(|c| c.name.clone());
        p.is_liked = viewer.is_some_and(|u| self.liked.contains(&(u, p.id)));
        p
    }

    fn detailed(&self, id: ProductId, viewer: Option<UserId>) -> StoreResult<Product> {
        let product = self.products.get(&id).ok_or(StoreError::NotFound)?;
        let mut p = self.summary(product, viewer);
        p.sizes = self.sizes_of(id);
        p.media = self
            .media
            .values()
            .filter(|m| m.product_id == id)
            .cloned()
            .collect();
        p.rating = self.rating(id);
        Ok(p)
    }

    fn rating(&self, product: ProductId) -> Option<f64> {
        average_rating(
            self.reviews
                .values()
                .filter(|r| r.product_id == product)
                .map(|r| r.rating),
        )
    }

    fn page(&self, matching: impl Iterator<Item = Product>, page: Page) -> Vec<Product> {
        matching
            .skip(page.offset(PAGE_LIMIT) as usize)
            .take(PAGE_LIMIT as usize)
            .collect()
    }

    fn insert_media(&mut self, product: ProductId, media: &NewMedia) -> StoreResult<MediaId> {
        self.ensure_product(product)?;
        let id = MediaId::new(self.next_id());
        self.media.insert(
            id,
            ProductMedia {
                id,
                product_id: product,
                kind: media.kind,
                url: media.url.clone(),
            },
        );
        if media.sets_main_photo() {
            if let Some(p) = self.products.get_mut(&product) {
                p.main_photo_url = Some(media.url.clone());
            }
        }
        Ok(id)
    }

    fn remove_media(&mut self, id: MediaId) -> Option<ProductMedia> {
        let removed = self.media.remove(&id)?;
        if let Some(p) = self.products.get_mut(&removed.product_id) {
            if p.main_photo_url.as_deref() == Some(removed.url.as_str()) {
                p.main_photo_url = None;
            }
        }
        Some(removed)
    }

    fn order_mut(&mut self, id: OrderId) -> StoreResult<&mut Order> {
        self.orders.get_mut(&id).ok_or(StoreError::NotFound)
    }
}

/// Order listings carry no lines; [`OrderRepository::get_order`] does.
fn without_lines(order: &Order) -> Order {
    Order {
        lines: Vec::new(),
        ..order.clone()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    /// Current amount for a (product, size name) pair, if the row exists.
    pub fn stock(&self, product: ProductId, size: &str) -> StoreResult<Option<i32>> {
        Ok(self
            .read()?
            .sizes
            .values()
            .find(|s| s.product_id == product && s.name == size)
            .map(|s| s.amount))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, user: &NewUser) -> StoreResult<UserId> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.user.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        let id = UserId::new(state.next_id());
        state.users.insert(
            id,
            UserRow {
                user: User {
                    id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    role: user.role,
                },
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(id)
    }

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<(User, HashedPassword)>> {
        let state = self.read()?;
        Ok(state
            .users
            .values()
            .find(|u| u.user.email == email)
            .map(|u| (u.user.clone(), u.password_hash.clone())))
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        let state = self.read()?;
        state
            .users
            .get(&id)
            .map(|u| u.user.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn user_role(&self, id: UserId) -> StoreResult<Role> {
        Ok(self.get_user(id).await?.role)
    }

    async fn set_role(&self, id: UserId, role: Role) -> StoreResult<()> {
        let mut state = self.write()?;
        let row = state.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        row.user.role = role;
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn create_product(&self, product: &NewProduct) -> StoreResult<ProductId> {
        let mut state = self.write()?;
        if let Some(collection) = product.collection_id {
            if !state.collections.contains_key(&collection) {
                return Err(StoreError::InvalidReference(format!(
                    "collection {collection} does not exist"
                )));
            }
        }

        let id = ProductId::new(state.next_id());
        state.products.insert(
            id,
            Product {
                id,
                name: product.name.clone(),
                description: product.description.clone(),
                price: product.price,
                collection_id: product.collection_id,
                collection_name: None,
                category: product.category.clone(),
                color: product.color.clone(),
                main_photo_url: None,
                is_liked: false,
                media: Vec::new(),
                sizes: Vec::new(),
                rating: None,
            },
        );
        for size in &product.sizes {
            let size_id = SizeId::new(state.next_id());
            state.sizes.insert(
                size_id,
                Size {
                    id: size_id,
                    product_id: id,
                    name: size.name.clone(),
                    amount: size.amount,
                },
            );
        }
        Ok(id)
    }

    async fn get_product(&self, id: ProductId, viewer: Option<UserId>) -> StoreResult<Product> {
        self.read()?.detailed(id, viewer)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        viewer: Option<UserId>,
    ) -> StoreResult<Vec<Product>> {
        let state = self.read()?;
        let matching = state
            .products
            .values()
            .filter(|p| filter.matches(p, &state.sizes_of(p.id)))
            .map(|p| state.summary(p, viewer));
        Ok(state.page(matching, filter.page))
    }

    async fn search_products(
        &self,
        query: &str,
        page: Page,
        viewer: Option<UserId>,
    ) -> StoreResult<Vec<Product>> {
        let state = self.read()?;
        let needle = query.to_lowercase();
        let matching = state
            .products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .map(|p| state.summary(p, viewer));
        Ok(state.page(matching, page))
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.products.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        state.cart.retain(|c| c.product_id != id);
        state.liked.retain(|(_, p)| *p != id);
        state.media.retain(|_, m| m.product_id != id);
        state.reviews.retain(|_, r| r.product_id != id);
        state.sizes.retain(|_, s| s.product_id != id);
        Ok(())
    }

    async fn product_sizes(&self, id: ProductId) -> StoreResult<Vec<Size>> {
        Ok(self.read()?.sizes_of(id))
    }

    async fn update_sizes(&self, id: ProductId, update: &SizesUpdate) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.products.contains_key(&id) {
            return Err(StoreError::NotFound);
        }

        let removed: Vec<SizeId> = update
            .removed
            .iter()
            .copied()
            .filter(|sid| state.sizes.get(sid).is_some_and(|s| s.product_id == id))
            .collect();
        let remaining: BTreeSet<String> = state
            .sizes
            .values()
            .filter(|s| s.product_id == id && !removed.contains(&s.id))
            .map(|s| s.name.clone())
            .collect();
        if let Some(dup) = update.added.iter().find(|s| remaining.contains(&s.name)) {
            return Err(StoreError::Conflict(format!(
                "size {} already exists for product {id}",
                dup.name
            )));
        }

        for sid in removed {
            if let Some(size) = state.sizes.remove(&sid) {
                state
                    .cart
                    .iter_mut()
                    .filter(|c| c.product_id == id && c.size == size.name)
                    .for_each(|c| c.exists = false);
            }
        }
        for size in &update.added {
            let size_id = SizeId::new(state.next_id());
            state.sizes.insert(
                size_id,
                Size {
                    id: size_id,
                    product_id: id,
                    name: size.name.clone(),
                    amount: size.amount,
                },
            );
        }
        Ok(())
    }

    async fn set_stock_levels(&self, levels: &StockLevels) -> StoreResult<()> {
        let mut state = self.write()?;
        if let Some(missing) = levels.0.keys().find(|id| !state.sizes.contains_key(id)) {
            tracing::debug!(size_id = %missing, "stock update references unknown size");
            return Err(StoreError::NotFound);
        }
        for (id, amount) in &levels.0 {
            if let Some(size) = state.sizes.get_mut(id) {
                size.amount = *amount;
            }
        }
        Ok(())
    }

    async fn create_category(&self, name: &str) -> StoreResult<CategoryId> {
        let mut state = self.write()?;
        if state.categories.values().any(|c| c.name == name) {
            return Err(StoreError::Conflict(format!("category {name} already exists")));
        }
        let id = CategoryId::new(state.next_id());
        state.categories.insert(
            id,
            Category {
                id,
                name: name.to_string(),
            },
        );
        Ok(id)
    }

    async fn categories(&self) -> StoreResult<Vec<Category>> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn create_collection(&self, name: &str) -> StoreResult<CollectionId> {
        let mut state = self.write()?;
        if state.collections.values().any(|c| c.name == name) {
            return Err(StoreError::Conflict(format!("collection {name} already exists")));
        }
        let id = CollectionId::new(state.next_id());
        state.collections.insert(
            id,
            Collection {
                id,
                name: name.to_string(),
            },
        );
        Ok(id)
    }

    async fn collections(&self) -> StoreResult<Vec<Collection>> {
        Ok(self.read()?.collections.values().cloned().collect())
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn add_to_cart(
        &self,
        user: UserId,
        product: ProductId,
        size: &str,
        amount: i32,
    ) -> StoreResult<()> {
        let mut state = self.write()?;
        state.ensure_product(product)?;
        state.cart.push(CartRow {
            user_id: user,
            product_id: product,
            size: size.to_string(),
            amount,
            exists: true,
        });
        Ok(())
    }

    async fn remove_from_cart(&self, user: UserId, product: ProductId) -> StoreResult<()> {
        let mut state = self.write()?;
        state
            .cart
            .retain(|c| !(c.user_id == user && c.product_id == product));
        Ok(())
    }

    async fn cart(&self, user: UserId) -> StoreResult<Vec<CartItem>> {
        let state = self.read()?;
        Ok(state
            .cart
            .iter()
            .filter(|c| c.user_id == user)
            .filter_map(|c| {
                let p = state.products.get(&c.product_id)?;
                Some(CartItem {
                    product_id: c.product_id,
                    product_name: p.name.clone(),
                    main_photo_url: p.main_photo_url.clone(),
                    price: p.price,
                    size: c.size.clone(),
                    amount: c.amount,
                    exists: c.exists,
                })
            })
            .collect())
    }

    async fn like(&self, user: UserId, product: ProductId) -> StoreResult<()> {
        let mut state = self.write()?;
        state.ensure_product(product)?;
        state.liked.insert((user, product));
        Ok(())
    }

    async fn unlike(&self, user: UserId, product: ProductId) -> StoreResult<()> {
        self.write()?.liked.remove(&(user, product));
        Ok(())
    }

    async fn liked(&self, user: UserId) -> StoreResult<Vec<Product>> {
        let state = self.read()?;
        Ok(state
            .liked
            .iter()
            .filter(|(u, _)| *u == user)
            .filter_map(|(_, p)| state.products.get(p))
            .map(|p| state.summary(p, Some(user)))
            .collect())
    }
}

#[async_trait]
impl MediaRepository for InMemoryStore {
    async fn add_media(&self, product: ProductId, media: &NewMedia) -> StoreResult<MediaId> {
        self.write()?.insert_media(product, media)
    }

    async fn delete_media(&self, id: MediaId) -> StoreResult<()> {
        self.write()?
            .remove_media(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn update_media(
        &self,
        product: ProductId,
        removed: &[MediaId],
        added: &[NewMedia],
    ) -> StoreResult<Vec<MediaId>> {
        let mut state = self.write()?;
        state.ensure_product(product)?;
        for id in removed {
            if state.media.get(id).is_some_and(|m| m.product_id == product) {
                state.remove_media(*id);
            }
        }
        added
            .iter()
            .map(|m| state.insert_media(product, m))
            .collect()
    }

    async fn product_media(&self, product: ProductId) -> StoreResult<Vec<ProductMedia>> {
        Ok(self
            .read()?
            .media
            .values()
            .filter(|m| m.product_id == product)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn create_review(
        &self,
        product: ProductId,
        author: UserId,
        input: &ReviewInput,
    ) -> StoreResult<ReviewId> {
        let mut state = self.write()?;
        state.ensure_product(product)?;
        let user_name = state
            .users
            .get(&author)
            .map(|u| u.user.name.clone())
            .ok_or_else(|| StoreError::InvalidReference(format!("user {author} does not exist")))?;

        let id = ReviewId::new(state.next_id());
        state.reviews.insert(
            id,
            Review {
                id,
                product_id: product,
                user_id: author,
                user_name,
                rating: input.rating,
                comment: input.comment.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn reviews(&self, product: ProductId) -> StoreResult<Vec<Review>> {
        let state = self.read()?;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|r| r.product_id == product)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn get_review(&self, id: ReviewId) -> StoreResult<Review> {
        self.read()?
            .reviews
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_review(&self, id: ReviewId, input: &ReviewInput) -> StoreResult<()> {
        let mut state = self.write()?;
        let review = state.reviews.get_mut(&id).ok_or(StoreError::NotFound)?;
        review.rating = input.rating;
        review.comment = input.comment.clone();
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> StoreResult<()> {
        self.write()?
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn product_rating(&self, product: ProductId) -> StoreResult<Option<f64>> {
        Ok(self.read()?.rating(product))
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn place_order(&self, order: NewOrder) -> Result<Order, OrderError> {
        validate_basket(&order.lines)?;
        let mut state = self.write()?;

        // Resolve every line to a stock row that can cover it before touching anything.
        let covered: Vec<(SizeId, i32)> = order
            .lines
            .iter()
            .filter_map(|line| {
                state
                    .sizes
                    .values()
                    .find(|s| {
                        s.product_id == line.product_id
                            && s.name == line.size
                            && s.amount >= line.quantity
                    })
                    .map(|s| (s.id, line.quantity))
            })
            .collect();
        if covered.len() != order.lines.len() {
            return Err(OrderError::InsufficientStock);
        }

        for (size_id, quantity) in covered {
            if let Some(size) = state.sizes.get_mut(&size_id) {
                size.amount -= quantity;
            }
        }
        let id = OrderId::new(state.next_id());
        let placed = Order::from_new(id, order, Utc::now());
        state.orders.insert(id, placed.clone());
        Ok(placed)
    }

    async fn user_orders(&self, user: UserId, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let state = self.read()?;
        Ok(state
            .orders
            .values()
            .rev()
            .filter(|o| o.user_id == user && filter.matches(o))
            .map(without_lines)
            .collect())
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        let state = self.read()?;
        let mut order = state.orders.get(&id).cloned().ok_or(StoreError::NotFound)?;
        order.user_email = state.users.get(&order.user_id).map(|u| u.user.email.clone());
        Ok(order)
    }

    async fn orders_by_type(
        &self,
        order_type: OrderType,
        status: Option<OrderStatus>,
    ) -> StoreResult<Vec<Order>> {
        let filter = OrderFilter {
            status,
            order_type: Some(order_type),
        };
        let state = self.read()?;
        Ok(state
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .map(without_lines)
            .collect())
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<()> {
        self.write()?.order_mut(id)?.status = status;
        Ok(())
    }

    async fn set_delivery_id(&self, id: OrderId, delivery_id: &str) -> StoreResult<()> {
        self.write()?.order_mut(id)?.delivery_id = Some(delivery_id.to_string());
        Ok(())
    }

    async fn set_pickup_id(&self, id: OrderId, pickup_id: &str) -> StoreResult<()> {
        self.write()?.order_mut(id)?.pickup_id = Some(pickup_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dresscode_catalog::{MediaKind, NewSize};

    fn new_product(name: &str, sizes: &[(&str, i32)]) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            price: 2_500,
            collection_id: None,
            category: "dresses".to_string(),
            color: "black".to_string(),
            sizes: sizes
                .iter()
                .map(|(n, a)| NewSize {
                    name: n.to_string(),
                    amount: *a,
                })
                .collect(),
        }
    }

    async fn user(store: &InMemoryStore, email: &str) -> UserId {
        let new = NewUser::new("Ann", email, HashedPassword::from_hash("x"), Role::Customer).unwrap();
        store.create_user(&new).await.unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = InMemoryStore::new();
        user(&store, "a@b.co").await;
        let again = NewUser::new("Bob", "a@b.co", HashedPassword::from_hash("x"), Role::Customer).unwrap();
        assert!(matches!(store.create_user(&again).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn removed_size_flags_cart_lines() {
        let store = InMemoryStore::new();
        let u = user(&store, "a@b.co").await;
        let p = store.create_product(&new_product("Dress", &[("M", 2), ("L", 1)])).await.unwrap();
        store.add_to_cart(u, p, "M", 1).await.unwrap();

        let m = store
            .product_sizes(p)
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.name == "M")
            .unwrap();
        let update = SizesUpdate {
            removed: vec![m.id],
            added: vec![dresscode_catalog::NewSize { name: "XL".to_string(), amount: 3 }],
        };
        store.update_sizes(p, &update).await.unwrap();

        let cart = store.cart(u).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert!(!cart[0].exists);
        let names: Vec<_> = store.product_sizes(p).await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["L".to_string(), "XL".to_string()]);
    }

    #[tokio::test]
    async fn adding_an_existing_size_changes_nothing() {
        let store = InMemoryStore::new();
        let p = store.create_product(&new_product("Dress", &[("M", 2)])).await.unwrap();
        let update = SizesUpdate {
            removed: Vec::new(),
            added: vec![NewSize { name: "M".to_string(), amount: 9 }],
        };
        assert!(matches!(store.update_sizes(p, &update).await, Err(StoreError::Conflict(_))));
        assert_eq!(store.stock(p, "M").unwrap(), Some(2));
    }

    #[tokio::test]
    async fn main_photo_follows_media() {
        let store = InMemoryStore::new();
        let p = store.create_product(&new_product("Dress", &[])).await.unwrap();
        let photo = NewMedia {
            kind: MediaKind::Photo,
            url: "https://cdn/1.jpg".to_string(),
            is_main: true,
        };
        let id = store.add_media(p, &photo).await.unwrap();
        assert_eq!(
            store.get_product(p, None).await.unwrap().main_photo_url.as_deref(),
            Some("https://cdn/1.jpg")
        );

        store.delete_media(id).await.unwrap();
        let product = store.get_product(p, None).await.unwrap();
        assert_eq!(product.main_photo_url, None);
        assert!(product.media.is_empty());
    }

    #[tokio::test]
    async fn filters_and_likes_apply_to_listing() {
        let store = InMemoryStore::new();
        let u = user(&store, "a@b.co").await;
        let in_stock = store.create_product(&new_product("Dress", &[("M", 1)])).await.unwrap();
        store.create_product(&new_product("Skirt", &[("M", 0)])).await.unwrap();
        store.like(u, in_stock).await.unwrap();

        let filter = ProductFilter {
            sizes: vec!["M".to_string()],
            ..Default::default()
        };
        let listed = store.list_products(&filter, Some(u)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, in_stock);
        assert!(listed[0].is_liked);

        let found = store.search_products("SKI", Page::FIRST, None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Skirt");
    }

    #[tokio::test]
    async fn listing_pages_by_twenty_one() {
        let store = InMemoryStore::new();
        for i in 0..25 {
            store.create_product(&new_product(&format!("P{i}"), &[])).await.unwrap();
        }
        let mut filter = ProductFilter::default();
        assert_eq!(store.list_products(&filter, None).await.unwrap().len(), 21);
        filter.page = Page::new(2);
        assert_eq!(store.list_products(&filter, None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn deleting_a_product_cleans_up_dependents() {
        let store = InMemoryStore::new();
        let u = user(&store, "a@b.co").await;
        let p = store.create_product(&new_product("Dress", &[("M", 1)])).await.unwrap();
        store.add_to_cart(u, p, "M", 1).await.unwrap();
        store.like(u, p).await.unwrap();
        store
            .create_review(p, u, &ReviewInput { rating: 4, comment: String::new() })
            .await
            .unwrap();

        store.delete_product(p).await.unwrap();
        assert!(store.cart(u).await.unwrap().is_empty());
        assert!(store.liked(u).await.unwrap().is_empty());
        assert!(store.product_sizes(p).await.unwrap().is_empty());
        assert_eq!(store.get_product(p, None).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn rating_is_the_mean_of_reviews() {
        let store = InMemoryStore::new();
        let u = user(&store, "a@b.co").await;
        let p = store.create_product(&new_product("Dress", &[])).await.unwrap();
        assert_eq!(store.product_rating(p).await.unwrap(), None);

        for rating in [3, 4] {
            store
                .create_review(p, u, &ReviewInput { rating, comment: "ok".to_string() })
                .await
                .unwrap();
        }
        assert_eq!(store.product_rating(p).await.unwrap(), Some(3.5));
        assert_eq!(store.reviews(p).await.unwrap()[0].user_name, "Ann");
    }

    #[tokio::test]
    async fn stock_levels_with_unknown_size_change_nothing() {
        let store = InMemoryStore::new();
        let p = store.create_product(&new_product("Dress", &[("M", 1)])).await.unwrap();
        let m = store.product_sizes(p).await.unwrap()[0].id;

        let mut levels = StockLevels::default();
        levels.0.insert(m, 7);
        levels.0.insert(SizeId::new(9_999), 1);
        assert_eq!(store.set_stock_levels(&levels).await, Err(StoreError::NotFound));
        assert_eq!(store.stock(p, "M").unwrap(), Some(1));

        levels.0.remove(&SizeId::new(9_999));
        store.set_stock_levels(&levels).await.unwrap();
        assert_eq!(store.stock(p, "M").unwrap(), Some(7));
    }

    #[tokio::test]
    async fn poisoned_lock_is_a_backend_error() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let p = store.create_product(&new_product("Dress", &[("M", 3)])).await.unwrap();

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.state.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.stock(p, "M"), Err(StoreError::Backend(_))));
        assert!(matches!(store.product_sizes(p).await, Err(StoreError::Backend(_))));
    }
}
