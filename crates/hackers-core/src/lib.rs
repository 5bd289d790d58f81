//! Ambient plumbing shared by Hackers Club services.
//!
//! Environment configuration, tracing setup, request-id propagation, health
//! probes and a couple of serde helpers. Nothing in here knows about users or
//! tokens.

pub mod config;
pub mod health;
pub mod middleware;
pub mod serde;
pub mod tracing;
