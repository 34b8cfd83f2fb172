//! Local preference persistence.
//!
//! Provides:
//! - Typed scalar key-value storage (string, i32, i64, f32, f64, bool)
//!   backed by a single-table SQLite database
//! - Immediate (auto-commit) writes plus a scoped batch-edit mode that
//!   flushes atomically in one transaction
//! - Well-known key constants for everything the client persists
//!
//! ## Design Decisions
//! - The store is an explicit value constructed once at startup and passed
//!   by reference to every consumer; there is no global instance.
//! - A batch edit is a handle, not a mode switch: it flushes on `commit()`
//!   or on drop, so an abandoned batch cannot lose writes. Only one batch
//!   may be open at a time; opening a second one fails loudly.
//! - f64 values round-trip through their string encoding. The value column
//!   is uniformly TEXT, so the encoding carries the full precision.

pub mod store;

pub use store::{keys, PrefsBatch, PrefsStore};
