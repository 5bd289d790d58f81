pub mod content;
pub mod password;
pub mod repository;
pub mod types;
