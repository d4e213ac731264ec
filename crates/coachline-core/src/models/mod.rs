//! Wire types for the coaching session service.
//!
//! - `LoginRequest`, `LoginResponse`, `Me`: authentication
//! - `Session`, `NewSession`: coaching sessions
//! - `AdminUser`: accounts as seen by administrators
//! - `Page`, `PageRequest`: the paginated list envelope shared by list endpoints

pub mod admin;
pub mod auth;
pub mod page;
pub mod session;

pub use admin::AdminUser;
pub use auth::{LoginRequest, LoginResponse, Me};
pub use page::{Page, PageRequest};
pub use session::{NewSession, Session};
