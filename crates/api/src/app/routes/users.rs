use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde_json::{json, Value};

use dresscode_auth::{Role, User};

use crate::app::dto::{MessageResponse, SetRoleRequest};
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn new_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.change_role(&principal, body.user_id, Role::Admin).await?;
    Ok(Json(MessageResponse::new("admin set successfully")))
}

pub async fn new_buyer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.change_role(&principal, body.user_id, Role::Buyer).await?;
    Ok(Json(MessageResponse::new("buyer set successfully")))
}

pub async fn remove_buyer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<MessageResponse>, ServiceError> {
    services.remove_buyer(&principal, body.user_id).await?;
    Ok(Json(MessageResponse::new("buyer removed successfully")))
}

pub async fn my_id(Extension(principal): Extension<PrincipalContext>) -> Result<Json<Value>, ServiceError> {
    Ok(Json(json!({ "id": principal.require_user()? })))
}

pub async fn my_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Json<Value>, ServiceError> {
    let role = services.my_role(&principal).await?;
    Ok(Json(json!({ "role": role })))
}

pub async fn my_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Json<User>, ServiceError> {
    Ok(Json(services.my_user(&principal).await?))
}
