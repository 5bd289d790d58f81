pub mod access;
pub mod account;
pub mod category;
pub mod comment;
pub mod post;
pub mod session;
pub mod user;
pub mod verification;
