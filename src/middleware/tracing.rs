use std::time::Duration;

use tracing::{info, warn};

use super::{Envelope, Middleware, MiddlewareResult};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Logs one event when a request enters the pipeline and one when it leaves
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn name(&self) -> &str {
        "tracing"
    }

    fn call(&self, req: &HandlerRequest) -> MiddlewareResult {
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "Request started"
        );
        Ok(Envelope::next())
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        if res.status >= 500 {
            warn!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms = latency.as_millis() as u64,
                "Request failed"
            );
        } else {
            info!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                status = res.status,
                latency_ms = latency.as_millis() as u64,
                "Request completed"
            );
        }
    }
}
