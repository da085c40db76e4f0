use std::fmt;

use http::Method;

use crate::pattern::PatternError;

/// Registration-time failure
///
/// Returned by route and middleware registration. Nothing is mutated when one
/// of these comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The method has no route table (only GET, POST, PUT, PATCH and DELETE do)
    UnsupportedMethod(Method),
    /// A registration call was made without a path
    MissingPath,
    /// Middleware must be registered under a non-empty name
    AnonymousMiddleware,
    /// The path template failed to compile
    Pattern(PatternError),
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::UnsupportedMethod(method) => {
                write!(f, "Unsupported method '{method}': no route table for it")
            }
            RouterError::MissingPath => write!(f, "A method and a path are both required"),
            RouterError::AnonymousMiddleware => write!(f, "Middleware name must not be empty"),
            RouterError::Pattern(e) => write!(f, "Invalid route template: {e}"),
        }
    }
}

impl std::error::Error for RouterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouterError::Pattern(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PatternError> for RouterError {
    fn from(e: PatternError) -> Self {
        RouterError::Pattern(e)
    }
}

/// Per-request routing outcome when no handler applies
///
/// Both variants answer 404; they differ only in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingMiss {
    /// The request method has no route table
    MethodNotFound,
    /// No template in the method's table matched the path
    RouteNotFound,
}

impl RoutingMiss {
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            RoutingMiss::MethodNotFound => "Method routes not found",
            RoutingMiss::RouteNotFound => "Route not found",
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        404
    }
}

impl fmt::Display for RoutingMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for RoutingMiss {}
