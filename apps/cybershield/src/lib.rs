//! # CyberShield Application Library
//!
//! The HTTP API, CLI and configuration layers of the `cybershield` binary,
//! exposed as a library so integration tests can build the router directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;

pub use error::AppError;
