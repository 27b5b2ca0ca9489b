pub mod auth;
pub mod master;
pub mod records;
pub mod shared;
pub mod users;
