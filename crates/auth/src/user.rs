use serde::{Deserialize, Serialize};

use dresscode_core::{DomainError, UserId};

use crate::{HashedPassword, Role};

/// A registered account as exposed to callers. The password hash never
/// leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Account about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: HashedPassword,
    pub role: Role,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: HashedPassword,
        role: Role,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_lowercase();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if !looks_like_email(&email) {
            return Err(DomainError::validation("email is not valid"));
        }
        Ok(Self {
            name,
            email,
            password_hash,
            role,
        })
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> HashedPassword {
        HashedPassword::from_hash("$argon2id$stub")
    }

    #[test]
    fn normalizes_email_and_name() {
        let u = NewUser::new("  Ann ", " Ann@Example.COM ", hash(), Role::Customer).unwrap();
        assert_eq!(u.name, "Ann");
        assert_eq!(u.email, "ann@example.com");
    }

    #[test]
    fn rejects_bad_input() {
        assert!(NewUser::new("", "a@b.co", hash(), Role::Customer).is_err());
        assert!(NewUser::new("Ann", "not-an-email", hash(), Role::Customer).is_err());
        assert!(NewUser::new("Ann", "a@nodot", hash(), Role::Customer).is_err());
    }
}
