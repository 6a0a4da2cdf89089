use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role stored on a user row.
///
/// `Customer` is what every sign-up gets. `Buyer` is shop staff working the
/// fulfilment queues. `Admin` manages the catalog and other users' roles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Buyer,
    #[default]
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Buyer => "buyer",
            Role::Customer => "customer",
        }
    }

    /// Role → permission policy.
    ///
    /// Admin holds the wildcard. Customers get nothing beyond acting on their
    /// own cart, wishlist, reviews and orders, which the service layer checks
    /// by ownership rather than by permission.
    pub fn permissions(&self) -> Vec<Permission> {
        match self {
            Role::Admin => vec![Permission::WILDCARD],
            Role::Buyer => vec![Permission::ORDERS_FULFIL, Permission::ORDERS_READ_ALL],
            Role::Customer => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "buyer" => Ok(Role::Buyer),
            "customer" => Ok(Role::Customer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for role in [Role::Admin, Role::Buyer, Role::Customer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn only_admin_holds_wildcard() {
        assert!(Role::Admin.permissions().iter().any(|p| p.is_wildcard()));
        assert!(!Role::Buyer.permissions().iter().any(|p| p.is_wildcard()));
        assert!(Role::Customer.permissions().is_empty());
    }
}
