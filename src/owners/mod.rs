pub mod auth;
pub mod manage;
