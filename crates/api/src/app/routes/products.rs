use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use dresscode_catalog::{NewMedia, NewProduct, Product, Size};
use dresscode_core::{CategoryId, CollectionId, MediaId, Page, ProductId};

use crate::app::dto::{
    CartRequest, IdResponse, MessageResponse, NameRequest, ProductsQuery, SearchQuery,
    StockLevelsRequest, UpdateMediaRequest, UpdateSizesRequest,
};
use crate::app::errors::ServiceError;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/search", get(search_products))
        .route("/categories", get(categories).post(create_category))
        .route("/collections", get(collections).post(create_collection))
        .route("/cart", get(cart))
        .route("/liked", get(liked))
        .route("/sizes/amount", put(set_stock_levels))
        .route("/media/:media_id", delete(delete_media))
        .route("/:id", get(get_product).delete(delete_product))
        .route("/:id/sizes", get(product_sizes).put(update_sizes))
        .route("/:id/cart", post(add_to_cart).delete(remove_from_cart))
        .route("/:id/liked", post(like).delete(unlike))
        .route("/:id/media", get(product_media).post(add_media).put(update_media))
}

type Services = Extension<Arc<AppServices>>;
type Principal = Extension<PrincipalContext>;

pub async fn create_product(
    Extension(services): Services,
    Extension(principal): Principal,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<IdResponse<ProductId>>), ServiceError> {
    let id = services.create_product(&principal, body).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn list_products(
    Extension(services): Services,
    Extension(principal): Principal,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Value>, ServiceError> {
    let products = services.products(&principal, query.into_filter()).await?;
    Ok(Json(json!({ "products": products })))
}

pub async fn search_products(
    Extension(services): Services,
    Extension(principal): Principal,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ServiceError> {
    let page = Page::new(query.page.unwrap_or(1));
    let products = services.search(&principal, &query.q, page).await?;
    Ok(Json(json!({ "products": products })))
}

pub async fn get_product(
    Extension(services): Services,
    Extension(principal): Principal,
    Path(id): Path<String>,
) -> Result<Json<Product>, ServiceError> {
    let id: ProductId = parse_id(&id)?;
    Ok(Json(services.product(&principal, id).await?))
}

pub async fn delete_product(
    Extension(services): Services,
    Extension(principal): Principal,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.delete_product(&principal, parse_id(&id)?).await?;
    Ok(Json(MessageResponse::new("product deleted")))
}

pub async fn product_sizes(
    Extension(services): Services,
    Path(id): Path<String>,
) -> Result<Json<Vec<Size>>, ServiceError> {
    Ok(Json(services.sizes(parse_id(&id)?).await?))
}

pub async fn update_sizes(
    Extension(services): Services,
    Extension(principal): Principal,
    Path(id): Path<String>,
    Json(body): Json<UpdateSizesRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services
        .update_sizes(&principal, parse_id(&id)?, body.into())
        .await?;
    Ok(Json(MessageResponse::new("sizes updated")))
}

pub async fn set_stock_levels(
    Extension(services): Services,
    Extension(principal): Principal,
    Json(body): Json<StockLevelsRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.set_stock_levels(&principal, body.into_levels()).await?;
    Ok(Json(MessageResponse::new("amounts updated")))
}

pub async fn categories(Extension(services): Services) -> Result<Json<Value>, ServiceError> {
    let categories = services.categories().await?;
    Ok(Json(json!({ "categories": categories })))
}

pub async fn create_category(
    Extension(services): Services,
    Extension(principal): Principal,
    Json(body): Json<NameRequest>,
) -> Result<(StatusCode, Json<IdResponse<CategoryId>>), ServiceError> {
    let id = services.create_category(&principal, &body.name).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn collections(Extension(services): Services) -> Result<Json<Value>, ServiceError> {
    let collections = services.collections().await?;
    Ok(Json(json!({ "collections": collections })))
}

pub async fn create_collection(
    Extension(services): Services,
    Extension(principal): Principal,
    Json(body): Json<NameRequest>,
) -> Result<(StatusCode, Json<IdResponse<CollectionId>>), ServiceError> {
    let id = services.create_collection(&principal, &body.name).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn add_to_cart(
    Extension(services): Services,
    Extension(principal): Principal,
    Path(id): Path<String>,
    Json(body): Json<CartRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services
        .add_to_cart(&principal, parse_id(&id)?, &body.size, body.amount)
        .await?;
    Ok(Json(MessageResponse::new("product added to cart")))
}

pub async fn remove_from_cart(
    Extension(services): Services,
    Extension(principal): Principal,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.remove_from_cart(&principal, parse_id(&id)?).await?;
    Ok(Json(MessageResponse::new("product removed from cart")))
}

pub async fn cart(
    Extension(services): Services,
    Extension(principal): Principal,
) -> Result<Json<Value>, ServiceError> {
    let products = services.cart(&principal).await?;
    Ok(Json(json!({ "products": products })))
}

pub async fn like(
    Extension(services): Services,
    Extension(principal): Principal,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.like(&principal, parse_id(&id)?).await?;
    Ok(Json(MessageResponse::new("product added to liked")))
}

pub async fn unlike(
    Extension(services): Services,
    Extension(principal): Principal,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.unlike(&principal, parse_id(&id)?).await?;
    Ok(Json(MessageResponse::new("product removed from liked")))
}

pub async fn liked(
    Extension(services): Services,
    Extension(principal): Principal,
) -> Result<Json<Value>, ServiceError> {
    let products = services.liked(&principal).await?;
    Ok(Json(json!({ "products": products })))
}

pub async fn product_media(
    Extension(services): Services,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    let media = services.media(parse_id(&id)?).await?;
    Ok(Json(json!({ "media": media })))
}

pub async fn add_media(
    Extension(services): Services,
    Extension(principal): Principal,
    Path(id): Path<String>,
    Json(body): Json<NewMedia>,
) -> Result<(StatusCode, Json<IdResponse<MediaId>>), ServiceError> {
    let id = services.add_media(&principal, parse_id(&id)?, body).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn update_media(
    Extension(services): Services,
    Extension(principal): Principal,
    Path(id): Path<String>,
    Json(body): Json<UpdateMediaRequest>,
) -> Result<Json<Value>, ServiceError> {
    let added = services
        .update_media(&principal, parse_id(&id)?, body.removed, body.added)
        .await?;
    Ok(Json(json!({ "added": added })))
}

pub async fn delete_media(
    Extension(services): Services,
    Extension(principal): Principal,
    Path(media_id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.delete_media(&principal, parse_id(&media_id)?).await?;
    Ok(Json(MessageResponse::new("media deleted")))
}
