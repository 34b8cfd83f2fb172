//! campus-connect: a command-line client for a college community service.
//!
//! Three layers, each injected into the next:
//! - [`prefs`]: durable typed key-value storage (SQLite-backed)
//! - [`session`]: the auth session and cached user profile rebuilt from it
//! - [`api`]: the authenticated REST client (current user, notices)
//!
//! The binary in `main.rs` wires them together behind a clap CLI.

pub mod api;
pub mod config;
pub mod prefs;
pub mod session;
