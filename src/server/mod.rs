//! # Server Module
//!
//! Glue between `may_minihttp` and the dispatch pipeline. Each accepted
//! connection runs in its own `may` coroutine; middleware and handlers run
//! inline on that coroutine, so blocking through `may` primitives suspends
//! only the current request.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle, MAX_REQUEST_HEADERS};
pub use request::parse_request;
pub use response::{write_handler_response, write_json_error};
pub use service::AppService;
