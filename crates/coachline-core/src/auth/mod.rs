//! Authentication state for the running client.
//!
//! This module provides:
//! - `SessionState`: the single writer of the current credential and roles
//! - `SessionReader` / `SessionView`: read-only access for the request
//!   pipeline and the access guard
//!
//! State lives in memory only and is gone when the process exits.

pub mod session;

pub use session::{SessionReader, SessionSnapshot, SessionState, SessionView};
