//! # CLI Module
//!
//! Command-line front end for the `trellis` binary.
//!
//! ## Commands
//!
//! ### `match`
//!
//! Match a path against a template and print the captures as JSON:
//!
//! ```bash
//! trellis match '/users/:id' /users/42
//! ```
//!
//! ### `generate`
//!
//! Build a path from a template. Give a repeated parameter several values by
//! repeating `-p`:
//!
//! ```bash
//! trellis generate '/files/:path+' -p path=a -p path=b
//! ```
//!
//! ### `inspect`
//!
//! Show the tokens, parsed segments and compiled regex of a template:
//!
//! ```bash
//! trellis inspect '/:foo/{:bar}?'
//! ```
//!
//! ### `serve`
//!
//! Run a small demo app (`/health`, `/metrics`, `/users/:id`, `/files/{*path}`)
//! configured from `PORT`, `HOSTNAME` and `TRELLIS_*` until SIGINT/SIGTERM.
//!
//! ## Usage from Code
//!
//! ```rust
//! use clap::Parser;
//! use trellis::cli::{execute, Cli};
//!
//! let cli = Cli::try_parse_from(["trellis", "generate", "/users/:id", "-p", "id=7"]).unwrap();
//! let mut out = Vec::new();
//! execute(&cli, &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "/users/7\n");
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{demo_app, execute, run_cli, Cli, Commands};
