use dresscode_core::UserId;

use crate::app::errors::ServiceError;

/// Identity of the caller for one request.
///
/// Every `/api` route receives one. It is anonymous when no bearer token was
/// sent; a token that was sent but failed validation never gets this far.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PrincipalContext {
    user_id: Option<UserId>,
}

impl PrincipalContext {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// The caller's id, or `Unauthenticated` for anonymous requests.
    pub fn require_user(&self) -> Result<UserId, ServiceError> {
        self.user_id.ok_or(ServiceError::Unauthenticated)
    }
}
