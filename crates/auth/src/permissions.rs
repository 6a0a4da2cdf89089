use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "catalog.manage").
/// The wildcard permission `"*"` grants everything and is reserved for admins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission::from_static("*");
    pub const CATALOG_MANAGE: Permission = Permission::from_static("catalog.manage");
    pub const USERS_MANAGE_ROLES: Permission = Permission::from_static("users.manage_roles");
    pub const REVIEWS_MODERATE: Permission = Permission::from_static("reviews.moderate");
    pub const ORDERS_FULFIL: Permission = Permission::from_static("orders.fulfil");
    pub const ORDERS_READ_ALL: Permission = Permission::from_static("orders.read_all");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
