use super::{Envelope, Middleware, MiddlewareResult};
use crate::dispatcher::HandlerRequest;

/// Static bearer-token check
///
/// Requests without `Authorization: Bearer <token>` are rejected with 401.
pub struct AuthMiddleware {
    token: String,
}

impl AuthMiddleware {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Middleware for AuthMiddleware {
    fn name(&self) -> &str {
        "auth"
    }

    fn call(&self, req: &HandlerRequest) -> MiddlewareResult {
        let presented = req
            .get_header("authorization")
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim);
        match presented {
            Some(token) if token == self.token => Ok(Envelope::next()),
            _ => Ok(Envelope::reject(
                401,
                serde_json::json!({ "message": "Unauthorized" }),
            )),
        }
    }
}
