pub mod access_code;
pub mod jwt;
pub mod middleware;
pub mod password;
