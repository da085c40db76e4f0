//! # Dispatcher Module
//!
//! Runs one request through the pipeline:
//!
//! 1. **Entry**: a method without a route table answers 404
//!    `{"message": "Method routes not found"}` straight away.
//! 2. **Middleware scan**: every middleware is called in registration order.
//!    A non-ok [`Envelope`](crate::middleware::Envelope) becomes the response.
//! 3. **Route scan**: the method's routes are tried in registration order and
//!    the first template that matches wins. No match answers 404
//!    `{"message": "Route not found"}`.
//! 4. **Handler execution**: the handler gets the request and the extracted
//!    path parameters.
//!
//! ## Error Handling
//!
//! Handlers and middleware return [`HandlerResult`]:
//! - `Ok(response)` is sent as-is
//! - `Err(HandlerError::EarlyExit(response))` is also sent as-is
//! - `Err(HandlerError::Fault(err))` becomes a 500 with `{"message": "<err>"}`
//! - Panics are caught and become a 500 as well
//!
//! Middleware `after` hooks see every response produced past the entry step.

mod core;

pub use core::{
    Dispatcher, Handler, HandlerError, HandlerRequest, HandlerResponse, HandlerResult, HeaderVec,
    QueryVec, MAX_INLINE_HEADERS,
};
