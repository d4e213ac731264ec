//! REST API client module for the coaching session service.
//!
//! `RequestPipeline` is the single path to the network: it attaches the
//! bearer token from the session, merges headers and normalizes every
//! response into a decoded value or an `ApiError`.
//!
//! The endpoint wrappers (`AuthApi`, `SessionsApi`, `AdminApi`) only shape
//! requests and pick the response type; they add no behaviour of their own
//! apart from login/logout updating the session.

pub mod admin;
pub mod auth;
pub mod error;
pub mod pipeline;
pub mod sessions;

pub use admin::AdminApi;
pub use auth::AuthApi;
pub use error::{ApiError, ApiResult, ErrorBody, NON_OBJECT_BODY_KEY};
pub use pipeline::{OutboundRequest, RequestPipeline};
pub use sessions::SessionsApi;
