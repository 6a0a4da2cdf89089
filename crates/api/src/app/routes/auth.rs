use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, routing::post, Json, Router};

use dresscode_auth::TokenPair;
use dresscode_core::UserId;

use crate::app::dto::{IdResponse, RefreshRequest, SignInRequest, SignUpRequest};
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/refresh", post(refresh))
}

pub async fn sign_up(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<IdResponse<UserId>>), ServiceError> {
    let id = services.sign_up(&body.name, &body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn sign_in(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<TokenPair>, ServiceError> {
    Ok(Json(services.sign_in(&body.email, &body.password).await?))
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ServiceError> {
    Ok(Json(services.refresh(&body.refresh_token)?))
}
