//! Well-known role name constants.
//!
//! These must match the role column in `config/policy.csv`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_GUEST: &str = "guest";

/// Account status assigned at registration, before e-mail verification.
pub const STATUS_PENDING: &str = "pending";
/// Account status of a verified account that may log in.
pub const STATUS_ACTIVE: &str = "active";
/// Account status of an account barred from logging in.
pub const STATUS_BLOCKED: &str = "blocked";
