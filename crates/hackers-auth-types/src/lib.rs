//! Credential plumbing shared by Hackers Club services.
//!
//! Provides the JWT token issuer, the `cookieValue` session cookie transport,
//! and the bearer-token gate for protected routes.

pub mod cookie;
pub mod identity;
pub mod token;
