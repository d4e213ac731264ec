//! Core library for coachline.
//!
//! Everything a client of the coaching session service needs to talk to it
//! as a signed-in user:
//!
//! - [`auth`]: the process-wide [`SessionState`] holding the bearer token and
//!   role claims, with change notifications
//! - [`api`]: the [`RequestPipeline`] every call goes through, the typed
//!   [`ApiError`], and thin wrappers for each REST endpoint
//! - [`guard`]: the [`AccessGuard`] consulted before a protected region is
//!   entered
//! - [`models`]: wire types for requests and responses
//! - [`config`]: persisted client configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;

pub use api::{ApiError, ApiResult, OutboundRequest, RequestPipeline};
pub use auth::{SessionReader, SessionSnapshot, SessionState, SessionView};
pub use config::Config;
pub use guard::{AccessGuard, Navigation, RouteAccessDecision};
