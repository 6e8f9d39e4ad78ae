//! Authentication and authorization module

pub mod cookie;
pub mod middleware;
pub mod password;
pub mod token;

pub use middleware::{
    auth_middleware, scope_middleware, AuthContext, AuthGuard, Carrier, RequiredScope,
};
pub use password::{HashingError, PasswordHasher};
pub use token::{Claims, TokenCodec, TokenError, TokenKind, VerifiedToken, ADMIN_SCOPE};
