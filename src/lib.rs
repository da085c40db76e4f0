//! # trellis
//!
//! A small HTTP router for the `may` coroutine runtime, built around an
//! Express-style route pattern engine.
//!
//! ## Overview
//!
//! Route templates such as `/users/:id`, `/files/{*path}` or
//! `/v:major(\d+){.:minor(\d+)}?` are lexed, parsed into a
//! [`PatternSequence`](pattern::PatternSequence), and compiled into a
//! [`Matcher`](pattern::Matcher) (path to parameters) and a
//! [`PathGenerator`](pattern::PathGenerator) (parameters to path).
//!
//! An [`App`](app::App) registers handlers per method and template, runs a
//! named middleware chain in front of them, and turns every outcome (match,
//! miss, rejection, error, panic) into a JSON response.
//!
//! ## Architecture
//!
//! - **[`pattern`]** - lexer, parser, matcher and generator for route templates
//! - **[`router`]** - per-method route tables with first-match-wins lookup
//! - **[`middleware`]** - ordered, named middleware plus tracing, metrics and auth
//! - **[`dispatcher`]** - request/response types and the dispatch pipeline
//! - **[`app`]** - registration surface with prefixes and serving
//! - **[`server`]** - `may_minihttp` service and server handle
//! - **[`runtime_config`]** / **[`logging`]** - environment-driven setup
//! - **[`cli`]** - the `trellis` command line
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService
//!     participant Disp as Dispatcher
//!     participant MW as Middleware chain
//!     participant Router
//!     participant Handler
//!
//!     Client->>Server: HTTP request
//!     Server->>Disp: dispatch(HandlerRequest)
//!     loop in registration order
//!         Disp->>MW: call(req)
//!         MW-->>Disp: Envelope { ok, status, data }
//!     end
//!     Disp->>Router: route(method, path)
//!     Router-->>Disp: RouteMatch | RoutingMiss
//!     Disp->>Handler: handle(req, params)
//!     Handler-->>Disp: HandlerResult
//!     Disp->>MW: after(req, res, latency)
//!     Disp-->>Server: HandlerResponse
//!     Server-->>Client: status + JSON body
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use trellis::{App, HandlerRequest, HandlerResponse};
//!
//! let mut app = App::new();
//! app.get("/hello/:name", |_req, params| {
//!     let name = params.get_str("name").unwrap_or("world");
//!     Ok(HandlerResponse::json(200, serde_json::json!({ "hello": name })))
//! })
//! .unwrap();
//!
//! let resp = app.handle(&HandlerRequest::new(Method::GET, "/hello/may"));
//! assert_eq!(resp.body["hello"], "may");
//!
//! let miss = app.handle(&HandlerRequest::new(Method::GET, "/bye"));
//! assert_eq!(miss.status, 404);
//! assert_eq!(miss.body["message"], "Route not found");
//! ```
//!
//! ## Configuration
//!
//! See [`runtime_config`] for `PORT`, `HOSTNAME`, `TRELLIS_PREFIX` and
//! `TRELLIS_STACK_SIZE`, and [`logging`] for the `TRELLIS_LOG_*` variables.

pub mod app;
pub mod cli;
pub mod dispatcher;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod pattern;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use app::App;
pub use dispatcher::{
    Dispatcher, Handler, HandlerError, HandlerRequest, HandlerResponse, HandlerResult,
};
pub use middleware::{Envelope, Middleware, MiddlewareResult};
pub use pattern::{Matcher, PathGenerator, PathParams, PatternError, PatternSequence};
pub use router::{Router, RouterError, RoutingMiss};
