//! Domain models for subtrack.
//!
//! These are the core types shared across all crates.

pub mod principal;
pub mod subscription;
pub mod user;
