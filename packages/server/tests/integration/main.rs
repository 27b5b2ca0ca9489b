
mod auth;
mod master;
mod records;
mod users;
