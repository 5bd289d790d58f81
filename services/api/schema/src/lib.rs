//! sea-orm entities backing the Hackers Club API.

pub mod categories;
pub mod comments;
pub mod one_time_codes;
pub mod posts;
pub mod users;
