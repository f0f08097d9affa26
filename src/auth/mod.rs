//! Token signing and password hashing

pub mod jwt;
pub mod password;

pub use jwt::{Claims, JwtError, JwtService, Role};
pub use password::{hash_password, verify_password};
