//! API-side authorization guard.
//!
//! Tokens carry only the user id. The role is read from the store on every
//! check, so a demoted account loses its permissions immediately.

use dresscode_auth::{authorize, Permission, Principal};
use dresscode_infra::{Store, StoreError};

use crate::app::errors::ServiceError;
use crate::context::PrincipalContext;

/// Resolve the caller's current role.
///
/// A token whose user no longer exists is treated as unauthenticated.
pub async fn resolve_principal(
    store: &dyn Store,
    ctx: &PrincipalContext,
) -> Result<Principal, ServiceError> {
    let user_id = ctx.require_user()?;
    let role = match store.user_role(user_id).await {
        Ok(role) => role,
        Err(StoreError::NotFound) => return Err(ServiceError::Unauthenticated),
        Err(e) => return Err(e.into()),
    };
    Ok(Principal::new(user_id, role))
}

/// Check `required` for the caller. Call this before touching any state.
pub async fn require_permission(
    store: &dyn Store,
    ctx: &PrincipalContext,
    required: &Permission,
) -> Result<Principal, ServiceError> {
    let principal = resolve_principal(store, ctx).await?;
    authorize(&principal, required)?;
    Ok(principal)
}
