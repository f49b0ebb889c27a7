//! Core: configuration, state, server and startup errors
//!
//! - [`Config`] - server configuration
//! - [`ServerState`] - shared state
//! - [`Server`] - HTTP server
//! - [`ServerError`] - startup errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::{Server, build_app, build_router};
pub use state::{ResourceVersions, ServerState};
