//! `dresscode-auth`: authentication and authorization boundary.
//!
//! Signs and checks tokens, hashes passwords and decides whether a role
//! grants a permission. No HTTP or storage here; looking up a user's current
//! role is the caller's job.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod user;

pub use authorize::{authorize, AuthzError, Principal};
pub use claims::{validate_claims, TokenClaims, TokenKind, TokenValidationError};
pub use jwt::{Hs256Tokens, JwtValidator, TokenError, TokenPair};
pub use password::{HashedPassword, PasswordError};
pub use permissions::Permission;
pub use roles::Role;
pub use user::{NewUser, User};
