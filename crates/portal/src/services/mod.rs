//! Business logic services for the portal.
//!
//! # Services
//!
//! - `auth` - Password sign-in with role routing, sign-up with rollback
//! - `session` - Gateway sessions bound to the browser session
//! - `routing` - Role-based destinations
//! - `catalog` - Active course listing (fail-open)
//! - `enrollment` - Batch enrollment and the selection screen state machine

pub mod auth;
pub mod catalog;
pub mod enrollment;
pub mod routing;
pub mod session;
