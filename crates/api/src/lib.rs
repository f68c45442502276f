//! HTTP API layer for quill.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: auth, posts, comments, likes, taxonomy,
//!   notifications, stats
//! - **Extractors**: authentication
//! - **Middleware**: bearer-token resolution, application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
