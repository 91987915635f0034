//! Student Portal Core - Shared types library.
//!
//! This crate provides common types used across the student portal components:
//! - `portal` - The web application (sign-in, sign-up, course selection, dashboards)
//! - `integration-tests` - End-to-end tests against the full router
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Everything
//! durable lives behind the identity gateway, so these types describe the
//! shape of what the gateway stores, not how it is stored.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, roles, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
