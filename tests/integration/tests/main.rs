//! End-to-end provider scenarios.
//!
//! Every scenario runs against the in-memory schema, so the whole suite
//! needs no external services.

mod authentication;
mod role_reconciliation;
mod settings;
mod user_management;
