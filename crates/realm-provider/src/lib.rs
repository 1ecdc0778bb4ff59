//! # realm-provider
//!
//! A user and role provider that works over differently shaped relational
//! schemas. Each realm maps its own entity, column and relationship names
//! onto one set of operations: authenticate, look up users and roles,
//! create and update users, reconcile role assignments, and track password
//! age.
//!
//! ## Components
//!
//! - [`RealmConfig`] - settings resolved against a schema (defaults, legacy
//!   names, relationship discovery)
//! - [`UserLookup`] - valid-user filtered queries
//! - [`RoleResolver`] - roles through the join entity
//! - [`Credentials`] - password matching, hashing and expiry
//! - [`UserMutator`] - user creation, updates and role reconciliation
//! - [`RealmProvider`] - the facade callers use
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use realm_auth::CryptPasswordHasher;
//! use realm_core::RealmSettings;
//! use realm_provider::{AuthOptions, RealmProvider};
//! use realm_storage::{MemorySchema, SchemaRegistry};
//!
//! # async fn example() -> Result<(), realm_provider::ProviderError> {
//! let registry = SchemaRegistry::single(Arc::new(MemorySchema::new()));
//! let provider = RealmProvider::from_settings(
//!     "main",
//!     &RealmSettings::new().roles_key("roles"),
//!     &registry,
//!     Arc::new(CryptPasswordHasher::default()),
//! )?;
//!
//! if provider.authenticate("dave", "beer", &AuthOptions::new()).await? {
//!     let roles = provider.get_user_roles("dave").await?;
//!     println!("{roles:?}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credential;
pub mod error;
pub mod lookup;
pub mod mutation;
pub mod naming;
pub mod provider;
pub mod roles;

#[cfg(test)]
mod fixtures;

pub use config::RealmConfig;
pub use credential::Credentials;
pub use error::{ProviderError, ProviderResult};
pub use lookup::{LookupField, UserLookup};
pub use mutation::{DetailsUpdate, UserMutator, RESET_CODE_KEY, USERNAME_KEY};
pub use provider::{AuthOptions, RealmProvider};
pub use roles::RoleResolver;
