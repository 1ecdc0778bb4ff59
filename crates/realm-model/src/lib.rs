//! # realm-model
//!
//! Data types shared by the realm provider and the schema facade.
//!
//! Providers operate over schemas whose shape is only known from realm
//! settings, so rows are dynamic [`Record`]s of [`Value`]s, searched with
//! [`Filter`]s and linked through declared [`Relationship`]s.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod filter;
pub mod record;
pub mod relationship;
pub mod value;

pub use error::{ModelError, ModelResult};
pub use filter::{Condition, Filter};
pub use record::{Record, RecordExt};
pub use relationship::{JoinColumn, JoinType, Multiplicity, Relationship};
pub use value::Value;
