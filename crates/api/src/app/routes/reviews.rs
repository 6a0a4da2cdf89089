use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use dresscode_catalog::ReviewInput;
use dresscode_core::{ProductId, ReviewId};

use crate::app::dto::{CreateReviewRequest, IdResponse, MessageResponse};
use crate::app::errors::ServiceError;
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// `GET /:id` takes a product id; `PUT` and `DELETE` on the same path take a
/// review id.
pub fn router() -> Router {
    Router::new()
        .route("/", post(create_review))
        .route(
            "/:id",
            get(product_reviews).put(update_review).delete(delete_review),
        )
        .route("/:id/rating", get(product_rating))
}

pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<IdResponse<ReviewId>>), ServiceError> {
    let input = ReviewInput {
        rating: body.rating,
        comment: body.comment,
    };
    let id = services
        .create_review(&principal, body.product_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn product_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    let product: ProductId = parse_id(&id)?;
    let reviews = services.reviews(product).await?;
    Ok(Json(json!({ "reviews": reviews })))
}

pub async fn product_rating(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    let product: ProductId = parse_id(&id)?;
    let rating = services.rating(product).await?;
    Ok(Json(json!({ "rating": rating })))
}

pub async fn update_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ReviewInput>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.update_review(&principal, parse_id(&id)?, body).await?;
    Ok(Json(MessageResponse::new("review updated")))
}

pub async fn delete_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.delete_review(&principal, parse_id(&id)?).await?;
    Ok(Json(MessageResponse::new("review deleted")))
}
