//! Compile a [`PatternSequence`] into an anchored regex and extract parameters.

use std::borrow::Cow;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use super::error::PatternError;
use super::params::{ParamValue, PathParams};
use super::parser::{ParamDescriptor, ParseOptions, PatternSequence, Segment};

/// Matching behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Literal text must match exactly when set; ASCII case-folded otherwise
    pub case_sensitive: bool,
    /// Allow a single trailing delimiter on the input
    pub trailing: bool,
    /// Anchor at the start of the input
    pub start: bool,
    /// Anchor at the end of the input; when unset the template matches a
    /// prefix that ends on a delimiter boundary
    pub end: bool,
    /// Treat runs of delimiters in the input as one
    pub loose: bool,
    /// Percent-decode captured values
    pub decode: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            trailing: true,
            start: true,
            end: true,
            loose: true,
            decode: true,
        }
    }
}

/// A successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// The portion of the input the template consumed
    pub path: String,
    pub params: PathParams,
}

/// Compiled matcher for one template
#[derive(Debug, Clone)]
pub struct Matcher {
    template: String,
    regex: Regex,
    keys: Vec<ParamDescriptor>,
    names: Vec<Arc<str>>,
    delimiter: char,
    options: MatchOptions,
    /// Whether the regex ends with a consuming delimiter boundary
    boundary: bool,
}

fn escape_literal(text: &str, delimiter: char, loose: bool) -> String {
    if !loose {
        return regex::escape(text);
    }
    let delim = regex::escape(&delimiter.to_string());
    let mut out = String::with_capacity(text.len() * 2);
    let mut in_run = false;
    let mut buf = [0u8; 4];
    for c in text.chars() {
        if c == delimiter {
            if !in_run {
                out.push_str(&format!("(?:{delim})+"));
                in_run = true;
            }
        } else {
            out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            in_run = false;
        }
    }
    out
}

/// Default capture: one or more characters that are not the delimiter
fn default_pattern(delimiter: char) -> String {
    format!("[^{}]+?", regex::escape(&delimiter.to_string()))
}

impl Matcher {
    /// Compile a template with default parse and match options
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        Self::with_options(template, &ParseOptions::default(), MatchOptions::default())
    }

    /// Parse and compile a template
    pub fn with_options(
        template: &str,
        parse: &ParseOptions,
        options: MatchOptions,
    ) -> Result<Self, PatternError> {
        let sequence = PatternSequence::parse_with(template, parse)?;
        Self::new(&sequence, options)
    }

    /// Compile an already-parsed sequence
    pub fn new(sequence: &PatternSequence, options: MatchOptions) -> Result<Self, PatternError> {
        let delimiter = sequence.delimiter();
        let loose = options.loose;
        let delim = regex::escape(&delimiter.to_string());
        let mut source = String::new();
        let mut keys = Vec::new();

        if !options.case_sensitive {
            source.push_str("(?i)");
        }
        if options.start {
            source.push('^');
        }

        for segment in sequence.segments() {
            match segment {
                Segment::Literal(text) => source.push_str(&escape_literal(text, delimiter, loose)),
                Segment::Group { text, modifier } => {
                    source.push_str(&format!(
                        "(?:{}){}",
                        escape_literal(text, delimiter, loose),
                        modifier.as_str()
                    ));
                }
                Segment::Param(param) => {
                    let pattern = param
                        .pattern
                        .clone()
                        .unwrap_or_else(|| default_pattern(delimiter));
                    let prefix = escape_literal(&param.prefix, delimiter, loose);
                    let suffix = escape_literal(&param.suffix, delimiter, loose);
                    if param.modifier.is_repeated() {
                        let sep = escape_literal(&param.separator, delimiter, loose);
                        source.push_str(&format!(
                            "(?:{prefix}((?:{pattern})(?:{sep}(?:{pattern}))*){suffix})"
                        ));
                    } else {
                        source.push_str(&format!("(?:{prefix}({pattern}){suffix})"));
                    }
                    if param.modifier.is_optional() {
                        source.push('?');
                    }
                    keys.push(param.clone());
                }
            }
        }

        let mut boundary = false;
        if options.trailing {
            source.push_str(&format!("(?:{delim})?"));
        }
        if options.end {
            source.push('$');
        } else {
            let ends_with_delimiter = matches!(
                sequence.segments().last(),
                Some(Segment::Literal(text)) if text.ends_with(delimiter)
            );
            if !ends_with_delimiter {
                source.push_str(&format!("(?:{delim}|$)"));
                boundary = true;
            }
        }

        let regex = Regex::new(&source).map_err(|e| PatternError::invalid_regex(&source, &e))?;
        debug!(
            template = %sequence.template(),
            regex = %source,
            params = keys.len(),
            "Compiled route pattern"
        );

        let names = keys.iter().map(|k| Arc::clone(&k.name)).collect();
        Ok(Self {
            template: sequence.template().to_string(),
            regex,
            keys,
            names,
            delimiter,
            options,
            boundary,
        })
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Generated regex source
    #[must_use]
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    /// Parameter descriptors in capture order
    #[must_use]
    pub fn keys(&self) -> &[ParamDescriptor] {
        &self.keys
    }

    #[must_use]
    pub fn options(&self) -> MatchOptions {
        self.options
    }

    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.matches(path).is_some()
    }

    /// Match `path` against the template.
    ///
    /// Returns `None` when the path does not match or a captured value fails
    /// to percent-decode.
    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;
        let whole = caps.get(0)?;
        let mut matched = whole.as_str();
        if self.boundary && whole.end() < path.len() {
            matched = matched.strip_suffix(self.delimiter).unwrap_or(matched);
        }

        let mut params = PathParams::new();
        for (i, key) in self.keys.iter().enumerate() {
            let Some(capture) = caps.get(i + 1) else {
                continue;
            };
            let raw = capture.as_str();
            let value = if key.modifier.is_repeated() {
                let mut pieces = Vec::new();
                for piece in raw.split(key.separator.as_str()) {
                    if piece.is_empty() && self.options.loose {
                        continue;
                    }
                    pieces.push(self.decode(&key.name, piece)?);
                }
                // nothing captured means absent, not an empty list
                if pieces.is_empty() {
                    continue;
                }
                ParamValue::Repeated(pieces)
            } else {
                ParamValue::Single(self.decode(&key.name, raw)?)
            };
            params.insert(Arc::clone(&self.names[i]), value);
        }

        Some(PathMatch {
            path: matched.to_string(),
            params,
        })
    }

    fn decode(&self, name: &str, raw: &str) -> Option<String> {
        if !self.options.decode {
            return Some(raw.to_string());
        }
        match urlencoding::decode(raw) {
            Ok(Cow::Borrowed(s)) => Some(s.to_string()),
            Ok(Cow::Owned(s)) => Some(s),
            Err(e) => {
                debug!(param = %name, value = %raw, error = %e, "Parameter failed to decode");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_param() {
        let m = Matcher::compile("/users/:id").unwrap();
        let result = m.matches("/users/42").unwrap();
        assert_eq!(result.path, "/users/42");
        assert_eq!(result.params.get_str("id"), Some("42"));
        assert!(m.matches("/users").is_none());
        assert!(m.matches("/users/42/posts").is_none());
    }

    #[test]
    fn test_trailing_delimiter_and_case() {
        let m = Matcher::compile("/users/:id").unwrap();
        assert!(m.is_match("/users/42/"));
        assert!(m.is_match("/USERS/42"));

        let strict = Matcher::with_options(
            "/users/:id",
            &ParseOptions::default(),
            MatchOptions {
                case_sensitive: true,
                trailing: false,
                ..MatchOptions::default()
            },
        )
        .unwrap();
        assert!(!strict.is_match("/users/42/"));
        assert!(!strict.is_match("/USERS/42"));
    }

    #[test]
    fn test_wildcard_pieces() {
        let m = Matcher::compile("/files/{*path}").unwrap();
        let result = m.matches("/files/a/b/c").unwrap();
        assert_eq!(result.params.get_all("path").unwrap(), &["a", "b", "c"]);

        let empty = m.matches("/files").unwrap();
        assert!(!empty.params.contains("path"));
    }

    #[test]
    fn test_loose_collapses_delimiters() {
        let m = Matcher::compile("/files/{*path}").unwrap();
        let result = m.matches("//files//a//b").unwrap();
        assert_eq!(result.params.get_all("path").unwrap(), &["a", "b"]);
    }

    #[test]
    fn test_decoding() {
        let m = Matcher::compile("/users/:name").unwrap();
        let result = m.matches("/users/caf%C3%A9").unwrap();
        assert_eq!(result.params.get_str("name"), Some("café"));
        assert!(m.matches("/users/%FF").is_none());
    }

    #[test]
    fn test_prefix_mode_boundary() {
        let m = Matcher::with_options(
            "/api",
            &ParseOptions::default(),
            MatchOptions {
                end: false,
                ..MatchOptions::default()
            },
        )
        .unwrap();
        assert_eq!(m.matches("/api/users").unwrap().path, "/api");
        assert_eq!(m.matches("/api").unwrap().path, "/api");
        assert!(m.matches("/apiary").is_none());
    }

    #[test]
    fn test_custom_pattern_and_optional() {
        let m = Matcher::compile(r"/v:version(\d+)/items/:id?").unwrap();
        let result = m.matches("/v2/items").unwrap();
        assert_eq!(result.params.get_str("version"), Some("2"));
        assert!(!result.params.contains("id"));
        assert!(m.matches("/vX/items").is_none());
    }

    #[test]
    fn test_empty_repetition_is_absent() {
        let m = Matcher::compile(r"/x{/:p(a*)}*").unwrap();
        let found = m.matches("/x/").unwrap();
        assert!(!found.params.contains("p"));
        assert!(found.params.is_empty());

        let found = m.matches("/x/aa").unwrap();
        assert_eq!(found.params.get_all("p").unwrap(), &["aa"]);
    }

    #[test]
    fn test_unanchored_start() {
        let m = Matcher::with_options(
            "/users/:id",
            &ParseOptions::default(),
            MatchOptions {
                start: false,
                ..MatchOptions::default()
            },
        )
        .unwrap();
        let found = m.matches("/x/users/42").unwrap();
        assert_eq!(found.path, "/users/42");
        assert_eq!(found.params.get_str("id"), Some("42"));
        assert!(!Matcher::compile("/users/:id").unwrap().is_match("/x/users/42"));
    }

    #[test]
    fn test_strict_delimiters() {
        let strict = MatchOptions {
            loose: false,
            ..MatchOptions::default()
        };
        let files = Matcher::with_options("/files/{*path}", &ParseOptions::default(), strict).unwrap();
        assert!(files.matches("/files//a").is_none());
        assert!(files.matches("/files/a//b").is_none());
        assert_eq!(
            files.matches("/files/a/b").unwrap().params.get_all("path").unwrap(),
            &["a", "b"]
        );

        let tags = Matcher::with_options(r"/tags{/:tag(\w*)}+", &ParseOptions::default(), strict)
            .unwrap();
        let found = tags.matches("/tags/a//b").unwrap();
        assert_eq!(found.params.get_all("tag").unwrap(), &["a", "", "b"]);

        let loose = Matcher::compile(r"/tags{/:tag(\w*)}+").unwrap();
        let found = loose.matches("/tags/a//b").unwrap();
        assert_eq!(found.params.get_all("tag").unwrap(), &["a", "b"]);
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        let err = Matcher::compile("/:id((?=x))").unwrap_err();
        assert!(err.is_parse_error());
        assert!(matches!(err, PatternError::InvalidRegex { .. }));
    }
}
