//! pdscreen daemon library - exposes modules for testing.

pub mod config;
pub mod network;
pub mod routes;
pub mod server;
