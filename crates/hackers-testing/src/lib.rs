//! Test utilities for Hackers Club services.
//!
//! Import from `[dev-dependencies]` only, never from production code.

pub mod auth;
