//! Session and profile projections over the preference store.
//!
//! The preference store owns all persisted state; the types here are
//! transient in-memory views rebuilt from it on demand:
//! - [`UserProfile`]: the signed-in user's attribute set, cached locally
//!   after a successful fetch and reconstructed on later launches
//! - [`AuthSession`]: the bearer token plus logged-in flag that gates
//!   authenticated requests

pub mod profile;

pub use profile::{AuthSession, SessionError, UserProfile};
