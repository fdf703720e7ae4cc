//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`session`] -- opaque bearer tokens backed by the `sessions` table.
//! - [`verification`] -- one-time email verification codes.

pub mod password;
pub mod session;
pub mod verification;
