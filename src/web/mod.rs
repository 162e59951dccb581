//! HTTP layer: axum routes composing the core subsystems

pub mod api;
pub mod files;
pub mod server;
pub mod static_files;

pub use server::WebServer;
