//! # meural-app
//!
//! Application layer: **port definitions** (traits) and in-process services.
//!
//! ## Responsibilities
//! - Define the [`Integration`](ports::Integration) lifecycle that adapter
//!   crates implement (setup, background polling, service calls, teardown)
//! - Define the [`IntegrationContext`](ports::IntegrationContext) port through
//!   which integrations publish discovered devices and entity snapshots
//! - Provide an in-memory registry implementing that port
//!
//! ## Dependency rule
//! Depends on `meural-domain` only (plus `tokio::sync` for locking).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
