//! HTTP client for the campus server.
//!
//! Provides:
//! - [`ApiClient`]: an immutable reqwest-backed client, one per
//!   authentication context, with the bearer token installed as a default
//!   header at construction time
//! - [`ApiError`]: the fetch outcome taxonomy, covering a well-formed
//!   server error, a transport failure, and an error body that itself
//!   failed to parse
//! - The [`Notice`] and [`RestError`] wire models
//!
//! ## Design Decisions
//! - No shared mutable client builder: every authenticated context gets its
//!   own `reqwest::Client`, so auth headers cannot accumulate across calls.
//! - The `Authorization` header carries the token verbatim; the server
//!   does not expect a "Bearer " prefix.
//! - No automatic retry; every failure is terminal at the fetch and the
//!   caller decides what happens next.

pub mod client;

pub use client::{ApiClient, ApiError, Notice, RestError};
