use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::{Envelope, Middleware, MiddlewareResult};
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Request counters
///
/// All counters use atomic operations for thread-safe updates without locks.
///
/// Metrics collected:
/// - Total request count
/// - Average latency
/// - Responses with a 4xx/5xx status
/// - 401 responses (authentication failures)
/// - Coroutine stack size
#[derive(Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    error_responses: AtomicUsize,
    auth_failures: AtomicUsize,
    stack_size: AtomicUsize,
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean processing time; zero before the first request
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses with a status of 400 or above
    pub fn error_responses(&self) -> usize {
        self.error_responses.load(Ordering::Relaxed)
    }

    pub fn auth_failures(&self) -> usize {
        self.auth_failures.load(Ordering::Relaxed)
    }

    /// Stack size of the coroutine that served the last request
    pub fn stack_size(&self) -> usize {
        self.stack_size.load(Ordering::Relaxed)
    }

    /// Prometheus text exposition of the counters
    pub fn render(&self) -> String {
        let series = [
            (
                "trellis_requests_total",
                "counter",
                "Total number of handled requests",
                self.request_count().to_string(),
            ),
            (
                "trellis_error_responses_total",
                "counter",
                "Responses with status >= 400",
                self.error_responses().to_string(),
            ),
            (
                "trellis_auth_failures_total",
                "counter",
                "Responses with status 401",
                self.auth_failures().to_string(),
            ),
            (
                "trellis_request_latency_seconds",
                "gauge",
                "Average request latency in seconds",
                self.average_latency().as_secs_f64().to_string(),
            ),
            (
                "trellis_coroutine_stack_bytes",
                "gauge",
                "Configured coroutine stack size",
                self.stack_size().to_string(),
            ),
        ];
        let mut body = String::new();
        for (name, kind, help, value) in series {
            body.push_str(&format!("# HELP {name} {help}\n# TYPE {name} {kind}\n{name} {value}\n"));
        }
        body
    }
}

impl Middleware for MetricsMiddleware {
    fn name(&self) -> &str {
        "metrics"
    }

    fn call(&self, _req: &HandlerRequest) -> MiddlewareResult {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        Ok(Envelope::next())
    }

    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        if res.status >= 400 {
            self.error_responses.fetch_add(1, Ordering::Relaxed);
        }
        if res.status == 401 {
            self.auth_failures.fetch_add(1, Ordering::Relaxed);
        }
        let size = if may::coroutine::is_coroutine() {
            may::coroutine::current().stack_size()
        } else {
            may::config().get_stack_size()
        };
        self.stack_size.store(size, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_render_exposition() {
        let metrics = MetricsMiddleware::new();
        let req = HandlerRequest::new(Method::GET, "/");
        metrics.call(&req).unwrap();
        let mut denied = HandlerResponse::error(401, "Unauthorized");
        metrics.after(&req, &mut denied, Duration::from_millis(2));

        let text = metrics.render();
        assert!(text.contains("# TYPE trellis_requests_total counter\ntrellis_requests_total 1\n"));
        assert!(text.contains("trellis_error_responses_total 1\n"));
        assert!(text.contains("trellis_auth_failures_total 1\n"));
        assert!(text.contains("# TYPE trellis_request_latency_seconds gauge\n"));
        assert_eq!(text.lines().filter(|l| l.starts_with("# HELP")).count(), 5);
        assert!(text.ends_with('\n'));
    }
}
