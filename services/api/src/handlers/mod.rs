pub mod category;
pub mod comment;
pub mod extract;
pub mod health;
pub mod post;
pub mod session;
pub mod user;
pub mod verification;
