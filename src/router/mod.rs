//! # Router Module
//!
//! Per-method route tables for the five supported verbs (GET, POST, PUT,
//! PATCH, DELETE).
//!
//! ## Architecture
//!
//! 1. **Registration**: a template such as `/users/:id` is parsed and compiled
//!    into a [`Matcher`](crate::pattern::Matcher) once, and stored with its
//!    handler at the end of the method's table. Registering the same template
//!    again swaps the handler in place.
//!
//! 2. **Matching**: the request path is tested against the method's entries in
//!    registration order. The first match wins and yields the extracted
//!    parameters; there is no specificity ranking.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use http::Method;
//! use trellis::dispatcher::{Handler, HandlerRequest, HandlerResponse, HandlerResult};
//! use trellis::pattern::PathParams;
//! use trellis::router::Router;
//!
//! fn get_user(_req: &HandlerRequest, params: &PathParams) -> HandlerResult {
//!     Ok(HandlerResponse::json(200, serde_json::json!({ "id": params.get_str("id") })))
//! }
//!
//! let mut router = Router::new();
//! let handler: Arc<dyn Handler> = Arc::new(get_user);
//! router.insert(Method::GET, "/users/:id", handler).unwrap();
//!
//! let found = router.route(&Method::GET, "/users/42").unwrap();
//! assert_eq!(found.get_path_param("id"), Some("42"));
//! ```

mod core;
mod error;

pub use core::{RouteEntry, RouteMatch, Router, METHODS};
pub use error::{RouterError, RoutingMiss};
