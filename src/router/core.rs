//! Router core module - hot path for request routing.
//!
//! Routes live in one ordered table per supported method. Lookup is a linear
//! scan in registration order and the first matching template wins; there is
//! no specificity ranking.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use tracing::{debug, info, warn};

use super::error::{RouterError, RoutingMiss};
use crate::dispatcher::Handler;
use crate::pattern::{MatchOptions, Matcher, ParseOptions, PathParams, PatternSequence};

/// Methods that get a route table, in table order
pub const METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// One registered (template, handler) pair
///
/// The matcher is compiled once when the entry is created and shared by
/// every request that scans it.
#[derive(Clone)]
pub struct RouteEntry {
    pub method: Method,
    /// Template exactly as registered (prefix already applied)
    pub path: Arc<str>,
    pub matcher: Arc<Matcher>,
    pub handler: Arc<dyn Handler>,
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("regex", &self.matcher.source())
            .finish_non_exhaustive()
    }
}

/// Result of successfully matching a request path to a route
#[derive(Clone)]
pub struct RouteMatch {
    pub method: Method,
    /// Template of the matched entry
    pub template: Arc<str>,
    pub handler: Arc<dyn Handler>,
    /// Parameters extracted from the path (e.g. `:id` → `{"id": "123"}`)
    pub path_params: PathParams,
    /// Portion of the request path the template consumed
    pub matched_path: String,
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("method", &self.method)
            .field("template", &self.template)
            .field("path_params", &self.path_params)
            .field("matched_path", &self.matched_path)
            .finish_non_exhaustive()
    }
}

impl RouteMatch {
    /// Single-valued path parameter by name
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get_str(name)
    }
}

/// Per-method route tables
#[derive(Clone)]
pub struct Router {
    tables: Vec<(Method, Vec<RouteEntry>)>,
    parse_options: ParseOptions,
    match_options: MatchOptions,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.route_lines())
            .field("match_options", &self.match_options)
            .finish()
    }
}

impl Router {
    /// Empty router with default pattern options
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default(), MatchOptions::default())
    }

    #[must_use]
    pub fn with_options(parse_options: ParseOptions, match_options: MatchOptions) -> Self {
        Self {
            tables: METHODS.iter().map(|m| (m.clone(), Vec::new())).collect(),
            parse_options,
            match_options,
        }
    }

    /// Does `method` have a route table?
    #[must_use]
    pub fn supports(&self, method: &Method) -> bool {
        self.table(method).is_some()
    }

    fn table(&self, method: &Method) -> Option<&Vec<RouteEntry>> {
        self.tables
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, entries)| entries)
    }

    fn table_mut(&mut self, method: &Method) -> Option<&mut Vec<RouteEntry>> {
        self.tables
            .iter_mut()
            .find(|(m, _)| m == method)
            .map(|(_, entries)| entries)
    }

    fn compile(&self, path: &str) -> Result<Matcher, RouterError> {
        let sequence = PatternSequence::parse_with(path, &self.parse_options)?;
        Ok(Matcher::new(&sequence, self.match_options)?)
    }

    /// Register `handler` for `method` and the template `path`.
    ///
    /// Registering the same method and template again replaces the handler
    /// but keeps the entry where it was in the table.
    ///
    /// # Errors
    ///
    /// Fails without touching the table when the method has no table, the
    /// path is empty, or the template does not compile.
    pub fn insert(
        &mut self,
        method: Method,
        path: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RouterError> {
        if path.is_empty() {
            return Err(RouterError::MissingPath);
        }
        if !self.supports(&method) {
            return Err(RouterError::UnsupportedMethod(method));
        }
        let matcher = Arc::new(self.compile(path)?);

        let Some(table) = self.table_mut(&method) else {
            return Err(RouterError::UnsupportedMethod(method));
        };
        if let Some(entry) = table.iter_mut().find(|e| &*e.path == path) {
            entry.matcher = matcher;
            entry.handler = handler;
            debug!(method = %method, path = %path, "Replaced existing route handler");
            return Ok(());
        }

        table.push(RouteEntry {
            method: method.clone(),
            path: Arc::from(path),
            matcher,
            handler,
        });
        info!(
            method = %method,
            path = %path,
            routes_count = table.len(),
            "Route registered"
        );
        Ok(())
    }

    /// Is there an entry for exactly this method and template?
    #[must_use]
    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.table(method)
            .is_some_and(|t| t.iter().any(|e| &*e.path == path))
    }

    /// Handler registered for exactly this method and template
    #[must_use]
    pub fn handler(&self, method: &Method, path: &str) -> Option<Arc<dyn Handler>> {
        self.table(method)?
            .iter()
            .find(|e| &*e.path == path)
            .map(|e| Arc::clone(&e.handler))
    }

    /// Swap the handler of every entry, across all methods, whose template is
    /// literally equal to `path`. Returns how many entries changed.
    ///
    /// This is string equality on the stored template, not pattern matching:
    /// `/users/:id` is only replaced by passing `/users/:id`.
    pub fn replace_all(&mut self, path: &str, handler: &Arc<dyn Handler>) -> usize {
        let mut replaced = 0;
        for (_, table) in &mut self.tables {
            for entry in table.iter_mut().filter(|e| &*e.path == path) {
                entry.handler = Arc::clone(handler);
                replaced += 1;
            }
        }
        debug!(path = %path, replaced = replaced, "Handler attached to existing routes");
        replaced
    }

    /// Resolve a request.
    ///
    /// # Errors
    ///
    /// [`RoutingMiss::MethodNotFound`] when the method has no table and
    /// [`RoutingMiss::RouteNotFound`] when no template in it matches.
    pub fn route(&self, method: &Method, path: &str) -> Result<RouteMatch, RoutingMiss> {
        // RT1: Route match attempt
        debug!(method = %method, path = %path, "Route match attempt");

        let Some(table) = self.table(method) else {
            warn!(method = %method, path = %path, "No route table for method");
            return Err(RoutingMiss::MethodNotFound);
        };

        let match_start = Instant::now();
        for entry in table {
            let Some(found) = entry.matcher.matches(path) else {
                continue;
            };
            let match_duration = match_start.elapsed();

            // RT2: Route matched
            if match_duration > Duration::from_millis(1) {
                warn!(
                    method = %method,
                    path = %path,
                    route_pattern = %entry.path,
                    path_params = ?found.params,
                    duration_us = match_duration.as_micros(),
                    "Slow route matching detected"
                );
            } else {
                info!(
                    method = %method,
                    path = %path,
                    route_pattern = %entry.path,
                    path_params = ?found.params,
                    duration_us = match_duration.as_micros(),
                    "Route matched"
                );
            }

            return Ok(RouteMatch {
                method: method.clone(),
                template: Arc::clone(&entry.path),
                handler: Arc::clone(&entry.handler),
                path_params: found.params,
                matched_path: found.path,
            });
        }

        // RT3: No route found (404)
        warn!(
            method = %method,
            path = %path,
            routes_scanned = table.len(),
            duration_us = match_start.elapsed().as_micros(),
            "No route matched"
        );
        Err(RoutingMiss::RouteNotFound)
    }

    /// All entries, table by table in method order, each in registration order
    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.tables.iter().flat_map(|(_, entries)| entries.iter())
    }

    /// `"METHOD path"` lines in table order
    #[must_use]
    pub fn route_lines(&self) -> Vec<String> {
        self.routes()
            .map(|e| format!("{} {}", e.method, e.path))
            .collect()
    }

    /// Print all registered routes to stdout
    pub fn dump_routes(&self) {
        for line in self.route_lines() {
            println!("{line}");
        }
    }

    /// Total number of entries across all methods
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.iter().map(|(_, t)| t.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
