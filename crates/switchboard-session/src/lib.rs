//! Per-session conversational state for the Switchboard router.
//!
//! Holds the ordered turn history and backend affinity of every active
//! session, with per-session locking and TTL-based eviction.

pub mod store;

pub use store::{Role, Session, SessionError, SessionStore, SessionSummary, Turn};
