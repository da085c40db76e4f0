//! # Runtime Configuration Module
//!
//! Environment-driven settings for a served [`App`](crate::app::App).
//!
//! ## Environment Variables
//!
//! | Variable             | Default     | Meaning                                   |
//! |----------------------|-------------|-------------------------------------------|
//! | `PORT`               | `8080`      | listening port                            |
//! | `HOSTNAME`           | `localhost` | listening host                            |
//! | `TRELLIS_PREFIX`     | empty       | prefix applied to every registered route  |
//! | `TRELLIS_STACK_SIZE` | `0x4000`    | coroutine stack size, decimal or `0x` hex |
//!
//! Unparseable values fall back to the default with a warning.
//!
//! ## Usage
//!
//! ```rust
//! use trellis::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_lookup(|key| match key {
//!     "PORT" => Some("9090".to_string()),
//!     "TRELLIS_STACK_SIZE" => Some("0x8000".to_string()),
//!     _ => None,
//! });
//! assert_eq!(config.bind_addr(), "localhost:9090");
//! assert_eq!(config.stack_size, 0x8000);
//! ```
//!
//! ## Stack size
//!
//! Each connection runs in its own `may` coroutine and middleware plus the
//! handler execute on that stack. Total memory is roughly
//! `stack_size × concurrent connections`.
//! - Simple handlers: `0x4000` (16 KB)
//! - Complex logic: `0x8000` (32 KB)
//! - Deep recursion: `0x10000` (64 KB)

use std::env;

use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOSTNAME: &str = "localhost";
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub port: u16,
    pub hostname: String,
    /// Route prefix, e.g. `/api/v1`
    pub prefix: String,
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            hostname: DEFAULT_HOSTNAME.to_string(),
            prefix: String::new(),
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

/// Decimal or `0x`-prefixed hexadecimal
pub fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

impl RuntimeConfig {
    /// Load configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, default = DEFAULT_PORT, "Invalid PORT, using default");
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        let hostname = lookup("HOSTNAME")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.hostname);

        let prefix = lookup("TRELLIS_PREFIX").unwrap_or_default();

        let stack_size = match lookup("TRELLIS_STACK_SIZE") {
            Some(raw) => parse_size(&raw).unwrap_or_else(|| {
                warn!(
                    value = %raw,
                    default = DEFAULT_STACK_SIZE,
                    "Invalid TRELLIS_STACK_SIZE, using default"
                );
                DEFAULT_STACK_SIZE
            }),
            None => defaults.stack_size,
        };

        Self {
            port,
            hostname,
            prefix,
            stack_size,
        }
    }

    /// `host:port` for binding
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}
