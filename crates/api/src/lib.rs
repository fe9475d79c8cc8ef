//! HTTP API layer for snapfeed.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: upload, feed, likes, comments, auth
//! - **Extractors**: required and optional authentication
//! - **Middleware**: bearer token resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
