use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};

use dresscode_orders::{Order, OrderFilter, OrderRequest, OrderType};

use crate::app::dto::{
    MessageResponse, SetDeliveryIdRequest, SetPickupIdRequest, SetStatusRequest, StatusQuery,
};
use crate::app::errors::ServiceError;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(my_orders).post(place_order))
        .route("/delivery", get(delivery_orders))
        .route("/pickup", get(pickup_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", put(set_status))
        .route("/:id/delivery-id", put(set_delivery_id))
        .route("/:id/pickup-id", put(set_pickup_id))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>), ServiceError> {
    let order = services.place_order(&principal, body).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn my_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Value>, ServiceError> {
    let orders = services.my_orders(&principal, filter).await?;
    Ok(Json(json!({ "orders": orders })))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(services.order(&principal, parse_id(&id)?).await?))
}

pub async fn delivery_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Value>, ServiceError> {
    let orders = services
        .orders_by_type(&principal, OrderType::Delivery, query.status)
        .await?;
    Ok(Json(json!({ "orders": orders })))
}

pub async fn pickup_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Value>, ServiceError> {
    let orders = services
        .orders_by_type(&principal, OrderType::Pickup, query.status)
        .await?;
    Ok(Json(json!({ "orders": orders })))
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.set_status(&principal, parse_id(&id)?, body.status).await?;
    Ok(Json(MessageResponse::new("status updated")))
}

pub async fn set_delivery_id(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<SetDeliveryIdRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services
        .set_delivery_id(&principal, parse_id(&id)?, &body.delivery_id)
        .await?;
    Ok(Json(MessageResponse::new("delivery id set")))
}

pub async fn set_pickup_id(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<SetPickupIdRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services
        .set_pickup_id(&principal, parse_id(&id)?, &body.pickup_id)
        .await?;
    Ok(Json(MessageResponse::new("pickup id set")))
}
