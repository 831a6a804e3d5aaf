//! # reportiq-api
//!
//! The gateway binary's library crate: configuration, shared state, route
//! handlers, and the router with its middleware stack.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod services;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
