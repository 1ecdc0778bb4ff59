//! # realm-core
//!
//! Realm settings, error handling and audit events shared by the realm
//! provider crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;

pub use config::{ProviderSettings, RealmSettings};
pub use error::{Error, Result};
pub use event::{Event, EventBuilder, EventOutcome, EventType};
