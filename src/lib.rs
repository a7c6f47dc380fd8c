//! TaskDesk server library.
//! This crate exposes internal modules for integration testing.
//! The binary entry point is in main.rs.

pub mod auth;
pub mod config;
pub mod db;
pub mod employees;
pub mod messages;
pub mod notify;
pub mod owners;
pub mod routes;
pub mod state;
pub mod tasks;
pub mod ws;
