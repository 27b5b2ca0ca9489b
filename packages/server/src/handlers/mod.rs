pub mod auth;
pub mod files;
pub mod master;
pub mod records;
pub mod users;
