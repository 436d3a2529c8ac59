//! HTTP API layer for quill.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: posts, groups, profiles, and the follow-feed timeline
//! - **Extractors**: authentication and pagination
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
