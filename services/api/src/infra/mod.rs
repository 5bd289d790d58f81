pub mod db;
pub mod images;
pub mod mailer;
pub mod sweeper;
