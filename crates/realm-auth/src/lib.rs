//! # realm-auth
//!
//! Credential collaborators for realm providers.
//!
//! ## Components
//!
//! - [`PasswordHasher`] / [`CryptPasswordHasher`] - salted SHA-2 and Argon2id hashing
//! - [`HashAlgorithm`] - algorithms new passwords can be hashed with
//! - [`SessionStore`] / [`MemorySessionStore`] - where last-login timestamps go
//!
//! ## Example
//!
//! ```rust
//! use realm_auth::{CryptPasswordHasher, HashAlgorithm, PasswordHasher};
//!
//! let hasher = CryptPasswordHasher::default();
//! let stored = hasher.hash("beer", HashAlgorithm::Sha512).unwrap();
//! assert!(hasher.matches("beer", &stored).unwrap());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod algorithm;
pub mod error;
pub mod password;
pub mod session;

pub use algorithm::HashAlgorithm;
pub use error::{AuthError, AuthResult};
pub use password::{CryptPasswordHasher, PasswordHasher, PasswordPolicy};
pub use session::{MemorySessionStore, SessionStore};
