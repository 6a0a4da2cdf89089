use std::collections::HashSet;

use thiserror::Error;

use dresscode_core::UserId;

use crate::{Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// The role must come from the user store at request time, not from a token,
/// so that a demoted admin loses access immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Whether this principal may act on a resource owned by `owner`, either as
    /// the owner or through `override_with`.
    pub fn owns_or_has(&self, owner: UserId, override_with: &Permission) -> bool {
        self.user_id == owner || authorize(self, override_with).is_ok()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal against a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal.role.permissions();
    let perms: HashSet<&str> = granted.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal::new(UserId::new(1), role)
    }

    #[test]
    fn admin_wildcard_grants_everything() {
        let admin = principal(Role::Admin);
        assert!(authorize(&admin, &Permission::CATALOG_MANAGE).is_ok());
        assert!(authorize(&admin, &Permission::new("anything.at.all")).is_ok());
    }

    #[test]
    fn buyer_can_fulfil_but_not_manage_catalog() {
        let buyer = principal(Role::Buyer);
        assert!(authorize(&buyer, &Permission::ORDERS_FULFIL).is_ok());
        assert!(authorize(&buyer, &Permission::ORDERS_READ_ALL).is_ok());
        assert_eq!(
            authorize(&buyer, &Permission::CATALOG_MANAGE),
            Err(AuthzError::Forbidden("catalog.manage".to_string()))
        );
    }

    #[test]
    fn customer_is_denied_every_named_permission() {
        let customer = principal(Role::Customer);
        for perm in [
            Permission::CATALOG_MANAGE,
            Permission::USERS_MANAGE_ROLES,
            Permission::ORDERS_FULFIL,
            Permission::ORDERS_READ_ALL,
        ] {
            assert!(authorize(&customer, &perm).is_err());
        }
    }

    #[test]
    fn ownership_or_override() {
        let customer = principal(Role::Customer);
        assert!(customer.owns_or_has(UserId::new(1), &Permission::ORDERS_READ_ALL));
        assert!(!customer.owns_or_has(UserId::new(2), &Permission::ORDERS_READ_ALL));

        let buyer = principal(Role::Buyer);
        assert!(buyer.owns_or_has(UserId::new(2), &Permission::ORDERS_READ_ALL));
    }
}
