//! # Middleware Module
//!
//! Middleware runs ahead of routing, in registration order. Each one returns an
//! [`Envelope`]; a non-ok envelope ends the request with its status and data and
//! the route handler is never called.
//!
//! ```rust
//! use std::sync::Arc;
//! use trellis::middleware::{from_fn, Envelope, MiddlewareChain};
//!
//! let mut chain = MiddlewareChain::new();
//! chain
//!     .insert(Arc::new(from_fn("block-admin", |req| {
//!         if req.path.starts_with("/admin") {
//!             Ok(Envelope::reject(403, serde_json::json!({ "message": "forbidden" })))
//!         } else {
//!             Ok(Envelope::next())
//!         }
//!     })))
//!     .unwrap();
//! assert_eq!(chain.len(), 1);
//! ```

mod auth;
mod core;
mod metrics;
mod tracing;

pub use auth::AuthMiddleware;
pub use core::{from_fn, Envelope, FnMiddleware, Middleware, MiddlewareChain, MiddlewareId, MiddlewareResult};
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
