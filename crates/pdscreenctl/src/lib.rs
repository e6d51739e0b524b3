//! pdscreen control - CLI client library.

pub mod client;
pub mod commands;
pub mod errors;
pub mod history;
pub mod payload;
