//! # Pattern Module
//!
//! The route-pattern engine. A path template such as `/users/:id` or
//! `/files/{*path}` goes through three stages:
//!
//! 1. **Lexing** ([`lex`]): the template becomes a flat token stream.
//! 2. **Parsing** ([`PatternSequence::parse`]): tokens become literal text and
//!    parameter descriptors.
//! 3. **Compilation**: the sequence is turned into a [`Matcher`] (anchored regex
//!    plus ordered keys) and/or a [`PathGenerator`] (the inverse direction).
//!
//! ## Template syntax
//!
//! | Syntax            | Meaning                                              |
//! |-------------------|------------------------------------------------------|
//! | `:name`           | named parameter, one segment                         |
//! | `:name(\d+)`      | named parameter with a custom expression             |
//! | `(\d+)`           | positional parameter (`"0"`, `"1"`, ...)             |
//! | `:name?` `:name+` | optional / one-or-more                               |
//! | `*` `*name`       | zero-or-more segments                                |
//! | `{/:name}?`       | group with prefix/suffix and a `? * +` modifier      |
//! | `{/:tag;,}+`      | group with an explicit separator                     |
//! | `\:`              | escaped structural character                         |
//!
//! ## Example
//!
//! ```rust
//! use trellis::pattern::{Matcher, PathGenerator, PathParams};
//!
//! let matcher = Matcher::compile("/users/:id").unwrap();
//! let found = matcher.matches("/users/42").unwrap();
//! assert_eq!(found.params.get_str("id"), Some("42"));
//!
//! let generator = PathGenerator::compile("/users/:id").unwrap();
//! let mut params = PathParams::new();
//! params.insert("id", "42");
//! assert_eq!(generator.generate(&params).unwrap(), "/users/42");
//! ```

mod error;
mod generator;
mod lexer;
mod matcher;
mod params;
mod parser;

pub use error::PatternError;
pub use generator::{GenerateOptions, PathGenerator};
pub use lexer::{lex, Token, TokenKind};
pub use matcher::{MatchOptions, Matcher, PathMatch};
pub use params::{ParamValue, PathParams, MAX_INLINE_PARAMS};
pub use parser::{
    Modifier, ParamDescriptor, ParseOptions, PatternSequence, Segment, DEFAULT_DELIMITER,
    DEFAULT_PREFIXES,
};
