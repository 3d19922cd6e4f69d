//! HTTP boundary for the session launch orchestrator.
//!
//! Exposes the liveness probe and the launch operation over axum, resolves
//! the caller's identity from auth-proxy headers, and wires the orchestrator
//! to a REST-backed cluster client.

pub mod api_docs;
pub mod auth;
pub mod cluster_rest;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::create_app;
pub use state::AppState;
