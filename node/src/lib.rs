//! lingua server node.
//!
//! Wires the content store, registry, resolver and sync engine together
//! from one [`NodeConfig`] and exposes them over a small admin HTTP API.

pub mod api;
pub mod config;
pub mod periodic;

pub use api::{AppState, ApiError, HealthResponse, ReloadResponse, ResolveResponse, build_router};
pub use config::{ConfigError, NodeConfig, ServerConfig};
pub use periodic::spawn_periodic_sync;
