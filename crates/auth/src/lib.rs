//! CityFlow - Auth
//!
//! Credential hashing and signed-token issuance for the query API.
//!
//! Tokens are JWTs signed with HMAC-SHA256 over a shared secret;
//! validation rejects any token whose header names a different algorithm
//! family. Passwords are hashed with bcrypt at the default cost.

mod error;
mod password;
mod token;

pub use error::{AuthError, Result};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};
