//! Template parser.
//!
//! Consumes the lexer's token stream and produces a [`PatternSequence`]: literal
//! text interleaved with parameter descriptors. The sequence is immutable once
//! built and is shared by both the matcher and the path generator.

use std::sync::Arc;

use super::error::PatternError;
use super::lexer::{lex, Token, TokenKind};

/// Default segment delimiter
pub const DEFAULT_DELIMITER: char = '/';

/// Characters a parameter may borrow from the literal right before it
pub const DEFAULT_PREFIXES: &str = "./";

/// Parser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Segment delimiter; parameters never match across it by default
    pub delimiter: char,
    /// Characters that become a parameter's prefix when they directly precede it
    pub prefixes: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            prefixes: DEFAULT_PREFIXES.to_string(),
        }
    }
}

/// Repetition of a parameter or group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modifier {
    #[default]
    None,
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Modifier {
    /// The modifier as it appears in templates and regex source
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Optional => "?",
            Modifier::ZeroOrMore => "*",
            Modifier::OneOrMore => "+",
        }
    }

    /// May the parameter be absent entirely?
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Modifier::Optional | Modifier::ZeroOrMore)
    }

    /// Does the parameter capture a collection of values?
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        matches!(self, Modifier::ZeroOrMore | Modifier::OneOrMore)
    }
}

/// Metadata for one named or positional capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    /// Explicit name, or a positional index (`"0"`, `"1"`, ...) for unnamed captures
    pub name: Arc<str>,
    /// Custom regex source; `None` means "one or more non-delimiter characters"
    pub pattern: Option<String>,
    pub modifier: Modifier,
    /// Literal text matched/emitted before the value
    pub prefix: String,
    /// Literal text matched/emitted after the value
    pub suffix: String,
    /// Literal text joining repeated values
    pub separator: String,
}

/// One element of a compiled template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Verbatim text
    Literal(String),
    /// A capture
    Param(ParamDescriptor),
    /// A brace group without a capture, e.g. `{/edit}?`
    Group { text: String, modifier: Modifier },
}

/// Parsed form of a path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSequence {
    template: String,
    segments: Vec<Segment>,
    delimiter: char,
}

impl PatternSequence {
    /// Parse a template with the default options
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        Self::parse_with(template, &ParseOptions::default())
    }

    /// Parse a template with explicit options
    pub fn parse_with(template: &str, options: &ParseOptions) -> Result<Self, PatternError> {
        let tokens = lex(template)?;
        let segments = Parser::new(tokens, options).run()?;
        Ok(Self {
            template: template.to_string(),
            segments,
            delimiter: options.delimiter,
        })
    }

    /// The template this sequence was parsed from
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Parameter descriptors in template order
    pub fn params(&self) -> impl Iterator<Item = &ParamDescriptor> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(p) => Some(p),
            _ => None,
        })
    }
}

fn default_separator(prefix: &str, suffix: &str, delimiter: char) -> String {
    let joined = format!("{prefix}{suffix}");
    if joined.is_empty() {
        delimiter.to_string()
    } else {
        joined
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    options: &'a ParseOptions,
    segments: Vec<Segment>,
    /// Literal text not yet flushed into a segment
    pending: String,
    /// Whether the last pending character came from an escape
    pending_escaped: bool,
    next_key: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, options: &'a ParseOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            options,
            segments: Vec::new(),
            pending: String::new(),
            pending_escaped: false,
            next_key: 0,
        }
    }

    fn peek(&self) -> &Token {
        // The lexer always terminates the stream with END, and `pos` never
        // advances past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn try_consume(&mut self, kind: TokenKind) -> Option<String> {
        let token = self.peek();
        if token.kind == kind && kind != TokenKind::End {
            let value = token.value.clone();
            self.pos += 1;
            Some(value)
        } else if token.kind == kind {
            Some(String::new())
        } else {
            None
        }
    }

    fn must_consume(&mut self, kind: TokenKind) -> Result<String, PatternError> {
        self.try_consume(kind).ok_or_else(|| {
            let token = self.peek();
            PatternError::parse(
                format!(
                    "Unexpected {} at {}, expected {}",
                    token.kind, token.index, kind
                ),
                token.index,
            )
        })
    }

    /// Consume a run of literal text. Outside groups `;` is plain text too.
    fn consume_text(&mut self, in_group: bool) -> (String, bool) {
        let mut text = String::new();
        let mut last_escaped = false;
        loop {
            let kind = self.peek().kind;
            let literal = match kind {
                TokenKind::Char | TokenKind::Comma | TokenKind::Bang | TokenKind::At => true,
                TokenKind::Semicolon => !in_group,
                TokenKind::Escaped => true,
                _ => false,
            };
            if !literal {
                break;
            }
            let token = &self.tokens[self.pos];
            text.push_str(&token.value);
            last_escaped = kind == TokenKind::Escaped;
            self.pos += 1;
        }
        (text, last_escaped)
    }

    fn try_modifier(&mut self, allow_asterisk: bool) -> Option<Modifier> {
        if self.try_consume(TokenKind::Question).is_some() {
            return Some(Modifier::Optional);
        }
        if self.try_consume(TokenKind::Plus).is_some() {
            return Some(Modifier::OneOrMore);
        }
        if allow_asterisk && self.peek().kind == TokenKind::Asterisk && self.peek().value.is_empty()
        {
            self.pos += 1;
            return Some(Modifier::ZeroOrMore);
        }
        None
    }

    fn positional_name(&mut self) -> Arc<str> {
        let key = self.next_key;
        self.next_key += 1;
        Arc::from(key.to_string())
    }

    /// Take the last pending literal character as a prefix when allowed.
    fn borrow_prefix(&mut self) -> String {
        if self.pending_escaped {
            return String::new();
        }
        match self.pending.chars().last() {
            Some(c) if self.options.prefixes.contains(c) => {
                self.pending.pop();
                c.to_string()
            }
            _ => String::new(),
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.segments
                .push(Segment::Literal(std::mem::take(&mut self.pending)));
        }
        self.pending_escaped = false;
    }

    fn push_text(&mut self, text: &str, last_escaped: bool) {
        if !text.is_empty() {
            self.pending.push_str(text);
            self.pending_escaped = last_escaped;
        }
    }

    fn run(mut self) -> Result<Vec<Segment>, PatternError> {
        loop {
            let (text, escaped) = self.consume_text(false);
            self.push_text(&text, escaped);

            let name = self.try_consume(TokenKind::Name);
            let pattern = self.try_consume(TokenKind::Pattern);
            if name.is_some() || pattern.is_some() {
                let prefix = self.borrow_prefix();
                self.flush();
                let modifier = self.try_modifier(false).unwrap_or_default();
                let name = match name {
                    Some(n) => Arc::from(n),
                    None => self.positional_name(),
                };
                let separator = default_separator(&prefix, "", self.options.delimiter);
                self.segments.push(Segment::Param(ParamDescriptor {
                    name,
                    pattern,
                    modifier,
                    prefix,
                    suffix: String::new(),
                    separator,
                }));
                continue;
            }

            if let Some(wildcard) = self.try_consume(TokenKind::Asterisk) {
                let prefix = self.borrow_prefix();
                self.flush();
                let name = if wildcard.is_empty() {
                    self.positional_name()
                } else {
                    Arc::from(wildcard)
                };
                self.segments.push(Segment::Param(ParamDescriptor {
                    name,
                    pattern: None,
                    modifier: Modifier::ZeroOrMore,
                    prefix,
                    suffix: String::new(),
                    separator: self.options.delimiter.to_string(),
                }));
                continue;
            }

            if self.try_consume(TokenKind::Open).is_some() {
                let open_index = self.tokens[self.pos - 1].index;
                self.parse_group(open_index)?;
                continue;
            }

            self.flush();
            self.must_consume(TokenKind::End)?;
            return Ok(self.segments);
        }
    }

    fn parse_group(&mut self, open_index: usize) -> Result<(), PatternError> {
        let (mut prefix, _) = self.consume_text(true);
        let name = self.try_consume(TokenKind::Name);
        let pattern = self.try_consume(TokenKind::Pattern);
        let wildcard = if name.is_none() && pattern.is_none() {
            self.try_consume(TokenKind::Asterisk)
        } else {
            None
        };
        let (suffix, _) = self.consume_text(true);

        let separator = if self.try_consume(TokenKind::Semicolon).is_some() {
            let sep_index = self.peek().index;
            let (sep, _) = self.consume_text(true);
            if sep.is_empty() {
                return Err(PatternError::parse(
                    format!("Missing separator at {sep_index}"),
                    sep_index,
                ));
            }
            Some(sep)
        } else {
            None
        };

        self.must_consume(TokenKind::Close)?;
        let explicit = self.try_modifier(true);

        if name.is_none() && pattern.is_none() && wildcard.is_none() {
            if separator.is_some() {
                return Err(PatternError::parse(
                    format!("Separator without a parameter in group at {open_index}"),
                    open_index,
                ));
            }
            let text = format!("{prefix}{suffix}");
            match explicit {
                None => self.push_text(&text, false),
                Some(modifier) => {
                    self.flush();
                    self.segments.push(Segment::Group { text, modifier });
                }
            }
            return Ok(());
        }

        if prefix.is_empty() {
            prefix = self.borrow_prefix();
        }
        self.flush();

        let is_wildcard = wildcard.is_some();
        let modifier = explicit.unwrap_or(if is_wildcard {
            Modifier::ZeroOrMore
        } else {
            Modifier::None
        });
        let name = match name.or(wildcard.filter(|w| !w.is_empty())) {
            Some(n) => Arc::from(n),
            None => self.positional_name(),
        };
        let separator =
            separator.unwrap_or_else(|| default_separator(&prefix, &suffix, self.options.delimiter));

        self.segments.push(Segment::Param(ParamDescriptor {
            name,
            pattern,
            modifier,
            prefix,
            suffix,
            separator,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(seq: &PatternSequence, idx: usize) -> &ParamDescriptor {
        seq.params().nth(idx).expect("param")
    }

    #[test]
    fn test_named_param_borrows_slash() {
        let seq = PatternSequence::parse("/users/:id").unwrap();
        assert_eq!(seq.segments().len(), 2);
        assert_eq!(seq.segments()[0], Segment::Literal("/users".into()));
        let id = param(&seq, 0);
        assert_eq!(&*id.name, "id");
        assert_eq!(id.prefix, "/");
        assert_eq!(id.modifier, Modifier::None);
        assert!(id.pattern.is_none());
    }

    #[test]
    fn test_custom_pattern_without_prefix() {
        let seq = PatternSequence::parse(r"/v:version(\d+)/ping").unwrap();
        assert_eq!(seq.segments()[0], Segment::Literal("/v".into()));
        let version = param(&seq, 0);
        assert_eq!(version.prefix, "");
        assert_eq!(version.pattern.as_deref(), Some(r"\d+"));
        assert_eq!(seq.segments()[2], Segment::Literal("/ping".into()));
    }

    #[test]
    fn test_unnamed_params_get_positional_names() {
        let seq = PatternSequence::parse(r"/(\d+)/*").unwrap();
        let names: Vec<&str> = seq.params().map(|p| &*p.name).collect();
        assert_eq!(names, vec!["0", "1"]);
        assert_eq!(param(&seq, 1).modifier, Modifier::ZeroOrMore);
        assert_eq!(param(&seq, 1).separator, "/");
    }

    #[test]
    fn test_wildcard_group() {
        let seq = PatternSequence::parse("/files/{*path}").unwrap();
        assert_eq!(seq.segments()[0], Segment::Literal("/files".into()));
        let path = param(&seq, 0);
        assert_eq!(&*path.name, "path");
        assert_eq!(path.prefix, "/");
        assert_eq!(path.modifier, Modifier::ZeroOrMore);
        assert_eq!(path.separator, "/");
    }

    #[test]
    fn test_group_with_prefix_suffix_and_modifier() {
        let seq = PatternSequence::parse("/report{-:year.}?").unwrap();
        let year = param(&seq, 0);
        assert_eq!(year.prefix, "-");
        assert_eq!(year.suffix, ".");
        assert_eq!(year.modifier, Modifier::Optional);
        assert_eq!(year.separator, "-.");
    }

    #[test]
    fn test_group_separator_override() {
        let seq = PatternSequence::parse("/tags{/:tag;,}+").unwrap();
        let tag = param(&seq, 0);
        assert_eq!(tag.separator, ",");
        assert_eq!(tag.modifier, Modifier::OneOrMore);
    }

    #[test]
    fn test_bare_modifiers() {
        let seq = PatternSequence::parse("/:a?/:b+").unwrap();
        assert_eq!(param(&seq, 0).modifier, Modifier::Optional);
        assert_eq!(param(&seq, 1).modifier, Modifier::OneOrMore);
    }

    #[test]
    fn test_anonymous_group() {
        let seq = PatternSequence::parse("/posts{/edit}?").unwrap();
        assert_eq!(
            seq.segments()[1],
            Segment::Group {
                text: "/edit".into(),
                modifier: Modifier::Optional
            }
        );
        assert_eq!(seq.params().count(), 0);

        let seq = PatternSequence::parse("/a{/b}").unwrap();
        assert_eq!(seq.segments(), &[Segment::Literal("/a/b".into())]);
    }

    #[test]
    fn test_escaped_prefix_is_not_borrowed() {
        let seq = PatternSequence::parse(r"/file\.:ext").unwrap();
        assert_eq!(seq.segments()[0], Segment::Literal("/file.".into()));
        assert_eq!(param(&seq, 0).prefix, "");
    }

    #[test]
    fn test_structural_chars_are_literal_outside_groups() {
        let seq = PatternSequence::parse("/a;b,c!d@e").unwrap();
        assert_eq!(seq.segments(), &[Segment::Literal("/a;b,c!d@e".into())]);
    }

    #[test]
    fn test_unexpected_tokens() {
        let err = PatternSequence::parse("/a}").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected CLOSE at 2, expected END");

        let err = PatternSequence::parse("/{a{b}}").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected OPEN at 3, expected CLOSE");

        let err = PatternSequence::parse("/a?").unwrap_err();
        assert!(err.to_string().starts_with("Unexpected QUESTION"));

        assert!(PatternSequence::parse("/{:a;}").is_err());
        assert!(PatternSequence::parse("/{a;b}").is_err());
    }

    #[test]
    fn test_custom_delimiter() {
        let options = ParseOptions {
            delimiter: '.',
            prefixes: ".".into(),
        };
        let seq = PatternSequence::parse_with("api.:version", &options).unwrap();
        assert_eq!(seq.delimiter(), '.');
        assert_eq!(param(&seq, 0).prefix, ".");
    }
}
