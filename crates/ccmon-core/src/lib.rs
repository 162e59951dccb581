//! Core library for ccmon.
//!
//! Contains the pieces with actual decision logic: scanning per-agent todo
//! files, deriving a display-ready agent state from them, persisting usage
//! snapshots to SQLite, and reading Claude Code session metadata. HTTP
//! serving lives in the `ccmon` binary crate.

pub mod derive;
pub mod session;
pub mod store;
pub mod todos;
