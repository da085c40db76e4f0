use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatcher::{HandlerError, HandlerRequest, HandlerResponse};
use crate::router::RouterError;

/// What a middleware hands back to the pipeline
///
/// `ok: true` lets the request continue. Anything else ends the request with
/// `status`, `status_text` and `data` as the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub ok: bool,
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Let the request continue
    #[must_use]
    pub fn next() -> Self {
        Self {
            ok: true,
            status: 200,
            status_text: "OK".to_string(),
            data: Value::Null,
        }
    }

    /// Stop the request with `status` and `data` as the body
    #[must_use]
    pub fn reject(status: u16, data: Value) -> Self {
        let status_text = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            ok: false,
            status,
            status_text,
            data,
        }
    }

    #[must_use]
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// Response for a rejected request
    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        let mut resp = HandlerResponse::json(self.status, self.data);
        if !self.status_text.is_empty() {
            resp.status_text = Some(self.status_text);
        }
        resp
    }
}

pub type MiddlewareResult = Result<Envelope, HandlerError>;

/// A request pre-processor
///
/// `call` runs in registration order before routing; `after` runs on every
/// response the pipeline produces once the method is known, including
/// rejections from other middleware.
pub trait Middleware: Send + Sync {
    /// Registration key; must not be empty
    fn name(&self) -> &str;

    fn call(&self, req: &HandlerRequest) -> MiddlewareResult;

    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}

/// Opaque handle returned by middleware registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MiddlewareId(usize);

impl MiddlewareId {
    /// Position of the middleware in the chain
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Ordered, name-keyed middleware list
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    entries: Vec<(Arc<str>, Arc<dyn Middleware>)>,
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(name, _)| name))
            .finish()
    }
}

impl MiddlewareChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a middleware under its name.
    ///
    /// A middleware whose name is already registered replaces the old one
    /// without moving it.
    ///
    /// # Errors
    ///
    /// [`RouterError::AnonymousMiddleware`] when the name is empty.
    pub fn insert(&mut self, middleware: Arc<dyn Middleware>) -> Result<MiddlewareId, RouterError> {
        let name = middleware.name();
        if name.is_empty() {
            return Err(RouterError::AnonymousMiddleware);
        }
        if let Some(idx) = self.entries.iter().position(|(n, _)| n.as_ref() == name) {
            self.entries[idx].1 = middleware;
            return Ok(MiddlewareId(idx));
        }
        self.entries.push((Arc::from(name), middleware));
        Ok(MiddlewareId(self.entries.len() - 1))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Middleware>> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, mw)| mw)
    }

    /// Registered names in execution order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Arc<dyn Middleware>)> {
        self.entries.iter().map(|(n, mw)| (n, mw))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Middleware backed by a closure
pub struct FnMiddleware<F> {
    name: String,
    f: F,
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(&HandlerRequest) -> MiddlewareResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, req: &HandlerRequest) -> MiddlewareResult {
        (self.f)(req)
    }
}

/// Wrap a closure as a named middleware
pub fn from_fn<F>(name: impl Into<String>, f: F) -> FnMiddleware<F>
where
    F: Fn(&HandlerRequest) -> MiddlewareResult + Send + Sync,
{
    FnMiddleware {
        name: name.into(),
        f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(_req: &HandlerRequest) -> MiddlewareResult {
        Ok(Envelope::next())
    }

    #[test]
    fn test_reregistering_keeps_position() {
        let mut chain = MiddlewareChain::new();
        let a = chain.insert(Arc::new(from_fn("a", allow))).unwrap();
        chain.insert(Arc::new(from_fn("b", allow))).unwrap();
        let again = chain.insert(Arc::new(from_fn("a", allow))).unwrap();
        assert_eq!(a, again);
        assert_eq!(chain.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut chain = MiddlewareChain::new();
        let err = chain.insert(Arc::new(from_fn("", allow))).unwrap_err();
        assert_eq!(err, RouterError::AnonymousMiddleware);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope::reject(403, serde_json::json!({"message": "forbidden"}));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["statusText"], "Forbidden");
        assert_eq!(json["ok"], false);

        let resp = envelope.into_response();
        assert_eq!(resp.status, 403);
        assert_eq!(resp.body["message"], "forbidden");
    }
}
