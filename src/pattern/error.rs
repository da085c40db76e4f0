use std::fmt;

/// Errors raised by the route-pattern engine.
///
/// `Parse` and `InvalidRegex` surface at registration time when a template is
/// compiled. `Value` only comes out of [`PathGenerator::generate`](super::PathGenerator::generate).
/// A path that simply does not match a template is not an error; matchers
/// return `None` for that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Malformed template (unbalanced group, empty capture, dangling colon, ...)
    Parse {
        /// Human-readable description including the position
        message: String,
        /// Character index in the template where the problem was detected
        index: usize,
    },
    /// A custom capture expression the regex engine refused to compile
    InvalidRegex {
        /// The full expression that was handed to the regex engine
        pattern: String,
        /// Error reported by the regex engine
        message: String,
    },
    /// Generation-time failure: missing value, wrong shape, or a value that
    /// does not satisfy the parameter's pattern
    Value {
        /// Name of the offending parameter
        name: String,
        /// Human-readable description
        message: String,
    },
}

impl PatternError {
    pub(crate) fn parse(message: impl Into<String>, index: usize) -> Self {
        PatternError::Parse {
            message: message.into(),
            index,
        }
    }

    pub(crate) fn value(name: &str, message: impl Into<String>) -> Self {
        PatternError::Value {
            name: name.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_regex(pattern: &str, err: &regex::Error) -> Self {
        PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            message: err.to_string(),
        }
    }

    /// True for template errors (`Parse` and `InvalidRegex`)
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            PatternError::Parse { .. } | PatternError::InvalidRegex { .. }
        )
    }

    /// True for generation errors
    #[must_use]
    pub fn is_value_error(&self) -> bool {
        matches!(self, PatternError::Value { .. })
    }

    /// Character index of a parse error, if this is one
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            PatternError::Parse { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Parse { message, .. } => write!(f, "{message}"),
            PatternError::InvalidRegex { pattern, message } => {
                write!(f, "Invalid pattern \"{pattern}\": {message}")
            }
            PatternError::Value { message, .. } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for PatternError {}
