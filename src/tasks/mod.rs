pub mod crud;
pub mod stats;
