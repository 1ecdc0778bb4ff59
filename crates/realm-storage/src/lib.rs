//! # realm-storage
//!
//! Schema access facade for realm providers.
//!
//! This crate defines the narrow interface a provider uses to reach its
//! relational store, plus an in-memory implementation.
//!
//! ## Components
//!
//! - [`Schema`] - search/create/update/delete, atomic change sets, relationship introspection
//! - [`MemorySchema`] - in-memory implementation
//! - [`SchemaRegistry`] - named schemas for multi-schema deployments

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod registry;
pub mod schema;

pub use error::{StorageError, StorageResult};
pub use memory::{EntityDefinition, MemorySchema};
pub use registry::{SchemaRegistry, DEFAULT_SCHEMA};
pub use schema::{Change, ChangeSet, Schema, SearchOptions};
