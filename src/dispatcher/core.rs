//! Dispatcher core module - hot path for request dispatch.
//!
//! A request walks `ENTRY → MIDDLEWARE_SCAN → ROUTE_SCAN → HANDLER_EXEC` and
//! always comes out as a [`HandlerResponse`]; faults and panics are converted
//! at this boundary and never reach the host server.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, error, info, warn};

use crate::ids::RequestId;
use crate::middleware::{Envelope, MiddlewareChain};
use crate::pattern::{PathParams, MAX_INLINE_PARAMS};
use crate::router::{Router, RoutingMiss};

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage; names are lower-cased on the way in
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Stack-allocated query parameter storage, in request order
pub type QueryVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// An incoming request as seen by middleware and handlers
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    pub method: Method,
    /// Path without the query string
    pub path: String,
    /// Decoded query string parameters
    pub query_params: QueryVec,
    pub headers: HeaderVec,
    /// Raw request body
    pub body: Vec<u8>,
}

impl HandlerRequest {
    /// Build a request from a method and a request target (`/path?query`)
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        let query_params = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect();
        Self {
            request_id: RequestId::new(),
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query_params,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// The body as UTF-8 text
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics for `?limit=10&limit=20`.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Response produced by a handler, a middleware or the pipeline itself
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    /// Reason phrase override; the canonical phrase is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// JSON body; a `Value::String` is written as plain text
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            status_text: None,
            headers,
            body,
        }
    }

    /// JSON response with a content-type header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self::new(status, headers, body)
    }

    /// Plain text response
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "text/plain".to_string()));
        Self::new(status, headers, Value::String(body.into()))
    }

    /// `{"message": ...}` error body
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "message": message }))
    }

    #[must_use]
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = Some(status_text.into());
        self
    }

    /// The reason phrase that goes on the status line
    #[must_use]
    pub fn reason(&self) -> &str {
        match &self.status_text {
            Some(text) if !text.is_empty() => text,
            _ => http::StatusCode::from_u16(self.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or(""),
        }
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Non-success outcome of a handler or middleware
///
/// `EarlyExit` carries a complete response that is sent as-is. `Fault` is any
/// other error; the pipeline answers it with a 500 carrying the error text.
/// Any `std::error::Error` converts into a `Fault`, so `?` works in handlers.
#[derive(Debug)]
pub enum HandlerError {
    EarlyExit(HandlerResponse),
    Fault(anyhow::Error),
}

impl HandlerError {
    /// A fault with a plain message
    pub fn fault(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        HandlerError::Fault(anyhow::Error::msg(message))
    }

    /// Wrap an `anyhow` error
    #[must_use]
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        HandlerError::Fault(err)
    }

    /// The response the pipeline sends for this outcome
    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        match self {
            HandlerError::EarlyExit(response) => response,
            HandlerError::Fault(err) => HandlerResponse::error(500, &format!("{err:#}")),
        }
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        HandlerError::Fault(anyhow::Error::new(err))
    }
}

impl From<HandlerResponse> for HandlerError {
    fn from(response: HandlerResponse) -> Self {
        HandlerError::EarlyExit(response)
    }
}

pub type HandlerResult = Result<HandlerResponse, HandlerError>;

/// A route handler
///
/// Runs inside the connection's coroutine, so blocking I/O through `may`
/// primitives suspends only this request.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: &HandlerRequest, params: &PathParams) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&HandlerRequest, &PathParams) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, req: &HandlerRequest, params: &PathParams) -> HandlerResult {
        self(req, params)
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("Handler panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("Handler panicked: {s}")
    } else {
        "Handler panicked".to_string()
    }
}

/// Route table plus middleware chain
#[derive(Clone, Default)]
pub struct Dispatcher {
    router: Router,
    middlewares: MiddlewareChain,
}

impl Dispatcher {
    #[must_use]
    pub fn new(router: Router, middlewares: MiddlewareChain) -> Self {
        Self {
            router,
            middlewares,
        }
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    #[must_use]
    pub fn middlewares(&self) -> &MiddlewareChain {
        &self.middlewares
    }

    pub fn middlewares_mut(&mut self) -> &mut MiddlewareChain {
        &mut self.middlewares
    }

    /// Run the full pipeline for one request
    #[must_use]
    pub fn dispatch(&self, req: &HandlerRequest) -> HandlerResponse {
        let request_id = req.request_id;

        // D1: Method table lookup
        if !self.router.supports(&req.method) {
            warn!(
                request_id = %request_id,
                method = %req.method,
                path = %req.path,
                "Method routes not found"
            );
            return HandlerResponse::error(
                RoutingMiss::MethodNotFound.status(),
                RoutingMiss::MethodNotFound.message(),
            );
        }

        let start = Instant::now();
        let mut resp = self
            .run_middleware(req)
            .unwrap_or_else(|| self.run_route(req));
        let latency = start.elapsed();

        // D5: Middleware after execution
        debug!(
            request_id = %request_id,
            middleware_count = self.middlewares.len(),
            response_status = resp.status,
            latency_ms = latency.as_millis() as u64,
            "Middleware after execution"
        );
        for (_, mw) in self.middlewares.iter() {
            mw.after(req, &mut resp, latency);
        }
        resp
    }

    /// Returns the short-circuit response, if any middleware produced one
    fn run_middleware(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        let request_id = req.request_id;
        debug!(
            request_id = %request_id,
            middleware_count = self.middlewares.len(),
            "Middleware before execution"
        );

        for (idx, (name, mw)) in self.middlewares.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| mw.call(req)));
            let resp = match outcome {
                Ok(Ok(Envelope { ok: true, .. })) => continue,
                Ok(Ok(envelope)) => {
                    // D2: Middleware short-circuit
                    info!(
                        request_id = %request_id,
                        middleware_idx = idx,
                        middleware_name = %name,
                        status = envelope.status,
                        "Middleware rejected request"
                    );
                    envelope.into_response()
                }
                Ok(Err(err)) => self.outcome_error(req, name, err),
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(
                        request_id = %request_id,
                        middleware_name = %name,
                        panic_message = %message,
                        "Middleware panicked"
                    );
                    HandlerResponse::error(500, &message)
                }
            };
            return Some(resp);
        }
        None
    }

    fn run_route(&self, req: &HandlerRequest) -> HandlerResponse {
        let request_id = req.request_id;
        let route_match = match self.router.route(&req.method, &req.path) {
            Ok(m) => m,
            Err(miss) => return HandlerResponse::error(miss.status(), miss.message()),
        };

        // D3: Request dispatched to handler
        info!(
            request_id = %request_id,
            method = %req.method,
            path = %req.path,
            route_pattern = %route_match.template,
            "Request dispatched to handler"
        );

        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            route_match.handler.call(req, &route_match.path_params)
        }));
        let elapsed: Duration = start.elapsed();

        match outcome {
            Ok(Ok(resp)) => {
                // D4: Handler execution complete
                info!(
                    request_id = %request_id,
                    route_pattern = %route_match.template,
                    status = resp.status,
                    execution_time_ms = elapsed.as_millis() as u64,
                    "Handler execution complete"
                );
                resp
            }
            Ok(Err(err)) => self.outcome_error(req, &route_match.template, err),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                let backtrace = std::backtrace::Backtrace::capture();
                error!(
                    request_id = %request_id,
                    route_pattern = %route_match.template,
                    panic_message = %message,
                    backtrace = %backtrace,
                    "Handler panicked - CRITICAL"
                );
                HandlerResponse::error(500, &message)
            }
        }
    }

    fn outcome_error(&self, req: &HandlerRequest, origin: &str, err: HandlerError) -> HandlerResponse {
        match &err {
            HandlerError::EarlyExit(resp) => debug!(
                request_id = %req.request_id,
                origin = %origin,
                status = resp.status,
                "Early exit response forwarded"
            ),
            HandlerError::Fault(e) => error!(
                request_id = %req.request_id,
                origin = %origin,
                error = %e,
                "Handler fault"
            ),
        }
        err.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_splits_query() {
        let req = HandlerRequest::new(Method::GET, "/search?q=a%20b&limit=10&limit=20");
        assert_eq!(req.path, "/search");
        assert_eq!(req.get_query_param("q"), Some("a b"));
        assert_eq!(req.get_query_param("limit"), Some("20"));
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = HandlerRequest::new(Method::GET, "/").with_header("X-Token", "abc");
        assert_eq!(req.get_header("x-token"), Some("abc"));
        assert_eq!(req.get_header("X-TOKEN"), Some("abc"));
    }

    #[test]
    fn test_json_body() {
        let req = HandlerRequest::new(Method::POST, "/").with_body(r#"{"name":"rex"}"#);
        let body: Value = req.json().unwrap();
        assert_eq!(body["name"], "rex");
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(HandlerResponse::error(404, "x").reason(), "Not Found");
        let custom = HandlerResponse::error(403, "x").with_status_text("Nope");
        assert_eq!(custom.reason(), "Nope");
    }

    #[test]
    fn test_error_conversion() {
        fn fails() -> HandlerResult {
            let n: i32 = "abc".parse()?;
            Ok(HandlerResponse::json(200, serde_json::json!(n)))
        }
        let resp = fails().unwrap_err().into_response();
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body["message"], "invalid digit found in string");
    }

    #[test]
    fn test_panic_message() {
        let panic = catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(panic.as_ref()), "Handler panicked: boom");
    }
}
