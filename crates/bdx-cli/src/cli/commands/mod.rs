//! CLI command handlers.

pub mod auth;
pub mod items;
pub mod watch;
