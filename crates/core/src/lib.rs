//! Domain building blocks shared by the storage and HTTP layers.
//!
//! Nothing in this crate performs I/O: the policy engine, the list filter
//! compiler and the update merger are pure functions over their inputs so
//! they can be unit tested in isolation.

pub mod error;
pub mod filter;
pub mod patch;
pub mod policy;
pub mod roles;
pub mod types;
pub mod value;
