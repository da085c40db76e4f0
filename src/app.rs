//! # App Module
//!
//! The registration surface. An [`App`] owns a route table and a middleware
//! chain, applies its prefix to every template registered through it, and can
//! serve itself over `may_minihttp`.
//!
//! ```rust
//! use http::Method;
//! use trellis::app::App;
//! use trellis::dispatcher::{HandlerRequest, HandlerResponse};
//!
//! let mut app = App::with_prefix("/api");
//! app.get("/users/:id", |_req, params| {
//!     Ok(HandlerResponse::json(200, serde_json::json!({ "id": params.get_str("id") })))
//! })
//! .unwrap();
//!
//! let resp = app.handle(&HandlerRequest::new(Method::GET, "/api/users/42"));
//! assert_eq!(resp.status, 200);
//! assert_eq!(resp.body["id"], "42");
//! assert_eq!(app.route_lines(), vec!["GET /api/users/:id"]);
//! ```

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use http::Method;
use tracing::{info, warn};

use crate::dispatcher::{Dispatcher, Handler, HandlerRequest, HandlerResponse, HandlerResult};
use crate::middleware::{Middleware, MiddlewareId};
use crate::pattern::{MatchOptions, ParseOptions, PathParams};
use crate::router::{Router, RouterError};
use crate::runtime_config::RuntimeConfig;
use crate::server::{AppService, HttpServer, ServerHandle};

/// Route and middleware registry with an optional serving loop
pub struct App {
    prefix: String,
    dispatcher: Dispatcher,
    stack_size: Option<usize>,
    server: Option<ServerHandle>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix("")
    }

    /// App whose registrations are all prefixed with `prefix`
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            dispatcher: Dispatcher::default(),
            stack_size: None,
            server: None,
        }
    }

    /// App with custom pattern options for every route
    #[must_use]
    pub fn with_options(
        prefix: impl Into<String>,
        parse_options: ParseOptions,
        match_options: MatchOptions,
    ) -> Self {
        let mut app = Self::with_prefix(prefix);
        *app.dispatcher.router_mut() = Router::with_options(parse_options, match_options);
        app
    }

    /// Prefix and coroutine stack size from a loaded configuration
    #[must_use]
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let mut app = Self::with_prefix(config.prefix.clone());
        app.stack_size = Some(config.stack_size);
        app
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        self.dispatcher.router()
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn full_path(&self, path: &str) -> Result<String, RouterError> {
        if path.is_empty() {
            return Err(RouterError::MissingPath);
        }
        Ok(format!("{}{}", self.prefix, path))
    }

    /// Register `handler` for `method` and `path` (prefix applied)
    ///
    /// # Errors
    ///
    /// See [`Router::insert`]; an empty `path` is [`RouterError::MissingPath`].
    pub fn add_method(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
    ) -> Result<(), RouterError> {
        let full = self.full_path(path)?;
        self.dispatcher
            .router_mut()
            .insert(method, &full, Arc::new(handler))
    }

    pub fn get<F>(&mut self, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(&HandlerRequest, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_method(Method::GET, path, handler)
    }

    pub fn post<F>(&mut self, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(&HandlerRequest, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_method(Method::POST, path, handler)
    }

    pub fn put<F>(&mut self, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(&HandlerRequest, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_method(Method::PUT, path, handler)
    }

    pub fn patch<F>(&mut self, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(&HandlerRequest, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_method(Method::PATCH, path, handler)
    }

    pub fn delete<F>(&mut self, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(&HandlerRequest, &PathParams) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_method(Method::DELETE, path, handler)
    }

    /// Catch-all registration.
    ///
    /// With a method and a path this is [`add_method`](Self::add_method).
    /// With only a path, the handler replaces the one on every existing entry,
    /// in any method, whose template is exactly `prefix + path`; nothing is
    /// added. Returns the number of entries that now use `handler`.
    ///
    /// # Errors
    ///
    /// [`RouterError::MissingPath`] when no path is given.
    pub fn use_handler(
        &mut self,
        method: Option<Method>,
        path: Option<&str>,
        handler: impl Handler,
    ) -> Result<usize, RouterError> {
        let Some(path) = path else {
            return Err(RouterError::MissingPath);
        };
        match method {
            Some(method) => self.add_method(method, path, handler).map(|()| 1),
            None => {
                let full = self.full_path(path)?;
                let handler: Arc<dyn Handler> = Arc::new(handler);
                let replaced = self.dispatcher.router_mut().replace_all(&full, &handler);
                if replaced == 0 {
                    warn!(path = %full, "use() matched no registered route");
                }
                Ok(replaced)
            }
        }
    }

    /// Append a middleware (or replace the one registered under its name)
    ///
    /// # Errors
    ///
    /// [`RouterError::AnonymousMiddleware`] for an empty name.
    pub fn add_middleware(
        &mut self,
        middleware: impl Middleware + 'static,
    ) -> Result<MiddlewareId, RouterError> {
        self.dispatcher
            .middlewares_mut()
            .insert(Arc::new(middleware))
    }

    /// Register several middleware in order
    ///
    /// # Errors
    ///
    /// [`RouterError::AnonymousMiddleware`] if any name is empty; the chain is
    /// left unchanged in that case.
    pub fn set_middleware<I>(&mut self, middlewares: I) -> Result<Vec<MiddlewareId>, RouterError>
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        let middlewares: Vec<_> = middlewares.into_iter().collect();
        if middlewares.iter().any(|mw| mw.name().is_empty()) {
            return Err(RouterError::AnonymousMiddleware);
        }
        let chain = self.dispatcher.middlewares_mut();
        middlewares
            .into_iter()
            .map(|mw| chain.insert(mw))
            .collect()
    }

    /// `"METHOD path"` for every route, in table order
    #[must_use]
    pub fn route_lines(&self) -> Vec<String> {
        self.router().route_lines()
    }

    /// Print every route to stdout
    pub fn print_routes(&self) {
        self.router().dump_routes();
    }

    /// Run one request through the pipeline
    #[must_use]
    pub fn handle(&self, req: &HandlerRequest) -> HandlerResponse {
        self.dispatcher.dispatch(req)
    }

    /// Start serving on `addr`.
    ///
    /// The server works on a snapshot of the current routes and middleware.
    ///
    /// # Errors
    ///
    /// Fails when already serving or when the address cannot be bound.
    pub fn serve<A: ToSocketAddrs>(&mut self, addr: A) -> io::Result<SocketAddr> {
        if self.server.is_some() {
            return Err(io::Error::new(io::ErrorKind::AddrInUse, "app is already serving"));
        }
        if let Some(stack_size) = self.stack_size {
            may::config().set_stack_size(stack_size);
        }
        let service = AppService::new(Arc::new(self.dispatcher.clone()));
        let handle = HttpServer(service).start(addr)?;
        handle.wait_ready()?;
        let bound = handle.addr();
        info!(
            addr = %bound,
            prefix = %self.prefix,
            routes_count = self.router().len(),
            middleware_count = self.dispatcher.middlewares().len(),
            "App serving"
        );
        self.server = Some(handle);
        Ok(bound)
    }

    /// Address of the running server, if any
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(ServerHandle::addr)
    }

    /// Stop the server started by [`serve`](Self::serve); no-op when idle
    pub fn close(&mut self) {
        if let Some(handle) = self.server.take() {
            handle.stop();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.close();
    }
}
