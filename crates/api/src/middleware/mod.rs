//! Request middleware.
//!
//! - [`auth::auth_gate`] -- authenticates the bearer token and applies the
//!   policy table before any handler runs.
//! - [`auth::AuthUser`] -- extracts the identity the gate attached.

pub mod auth;
