//! Relay server
//!
//! Accept loop and configuration.

pub mod config;
pub mod listener;

pub use config::ServerConfig;
pub use listener::ChatServer;
