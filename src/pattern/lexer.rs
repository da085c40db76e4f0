//! Template lexer.
//!
//! Turns a path template into a flat token stream. Structural characters become
//! single-character tokens; `:name`, `(pattern)` and `*name` are consumed as
//! units so the parser never has to look inside them.

use std::fmt;

use super::error::PatternError;

/// Kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Ordinary literal character
    Char,
    /// Backslash-escaped character; the value is the character itself
    Escaped,
    /// `:name`; the value is the identifier without the colon
    Name,
    /// `(expr)`; the value is the inner expression
    Pattern,
    /// `*` or `*name`; the value is the (possibly empty) identifier
    Asterisk,
    Open,
    Close,
    Question,
    Plus,
    Semicolon,
    Comma,
    Bang,
    At,
    End,
}

impl TokenKind {
    /// Upper-case label used in error messages
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Char => "CHAR",
            TokenKind::Escaped => "ESCAPED_CHAR",
            TokenKind::Name => "NAME",
            TokenKind::Pattern => "PATTERN",
            TokenKind::Asterisk => "ASTERISK",
            TokenKind::Open => "OPEN",
            TokenKind::Close => "CLOSE",
            TokenKind::Question => "QUESTION",
            TokenKind::Plus => "PLUS",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Bang => "BANG",
            TokenKind::At => "AT",
            TokenKind::End => "END",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexed token and the character index it started at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub index: usize,
    pub value: String,
}

impl Token {
    fn new(kind: TokenKind, index: usize, value: impl Into<String>) -> Self {
        Self {
            kind,
            index,
            value: value.into(),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn read_ident(chars: &[char], start: usize) -> String {
    chars[start.min(chars.len())..]
        .iter()
        .take_while(|c| is_ident_char(**c))
        .collect()
}

/// Scan a parenthesised expression starting at `chars[start] == '('`.
///
/// Returns the inner source and the index just past the closing paren.
fn read_pattern(chars: &[char], start: usize) -> Result<(String, usize), PatternError> {
    let mut depth = 1usize;
    let mut pattern = String::new();
    let mut j = start + 1;

    if chars.get(j) == Some(&'?') {
        return Err(PatternError::parse(
            format!("Pattern cannot start with \"?\" at {j}"),
            j,
        ));
    }

    while j < chars.len() {
        let c = chars[j];
        if c == '\\' {
            pattern.push(c);
            if let Some(next) = chars.get(j + 1) {
                pattern.push(*next);
            }
            j += 2;
            continue;
        }
        if c == ')' {
            depth -= 1;
            if depth == 0 {
                j += 1;
                break;
            }
        } else if c == '(' {
            depth += 1;
            let named = match chars.get(j + 2) {
                Some(&'<') | Some(&'\'') => true,
                Some(&'P') => chars.get(j + 3) == Some(&'<'),
                _ => false,
            };
            if chars.get(j + 1) != Some(&'?') || named {
                return Err(PatternError::parse(
                    format!("Capturing groups are not allowed at {j}"),
                    j,
                ));
            }
        }
        pattern.push(c);
        j += 1;
    }

    if depth != 0 {
        return Err(PatternError::parse(
            format!("Unbalanced pattern at {start}"),
            start,
        ));
    }
    if pattern.is_empty() {
        return Err(PatternError::parse(
            format!("Missing pattern at {start}"),
            start,
        ));
    }
    Ok((pattern, j))
}

/// `:id*` and `(\d+)*` read like a wildcard but are not one.
fn reject_trailing_asterisk(chars: &[char], at: usize) -> Result<(), PatternError> {
    if chars.get(at) == Some(&'*') {
        return Err(PatternError::parse(
            format!("Unexpected \"*\" after parameter at {at}, use a {{*name}} group instead"),
            at,
        ));
    }
    Ok(())
}

/// Tokenize a path template.
///
/// The returned stream always ends with a single [`TokenKind::End`] token.
pub fn lex(template: &str) -> Result<Vec<Token>, PatternError> {
    let chars: Vec<char> = template.chars().collect();
    let mut tokens = Vec::with_capacity(chars.len() + 1);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                let escaped = chars.get(i + 1).ok_or_else(|| {
                    PatternError::parse(format!("Trailing escape character at {i}"), i)
                })?;
                tokens.push(Token::new(TokenKind::Escaped, i, escaped.to_string()));
                i += 2;
            }
            ':' => {
                let name = read_ident(&chars, i + 1);
                if name.is_empty() {
                    return Err(PatternError::parse(
                        format!("Missing parameter name at {i}"),
                        i,
                    ));
                }
                let next = i + 1 + name.chars().count();
                if chars.get(next) != Some(&'(') {
                    reject_trailing_asterisk(&chars, next)?;
                }
                tokens.push(Token::new(TokenKind::Name, i, name));
                i = next;
            }
            '(' => {
                let (pattern, next) = read_pattern(&chars, i)?;
                reject_trailing_asterisk(&chars, next)?;
                tokens.push(Token::new(TokenKind::Pattern, i, pattern));
                i = next;
            }
            '*' => {
                let name = read_ident(&chars, i + 1);
                let next = i + 1 + name.chars().count();
                tokens.push(Token::new(TokenKind::Asterisk, i, name));
                i = next;
            }
            _ => {
                let kind = match c {
                    '{' => TokenKind::Open,
                    '}' => TokenKind::Close,
                    '?' => TokenKind::Question,
                    '+' => TokenKind::Plus,
                    ';' => TokenKind::Semicolon,
                    ',' => TokenKind::Comma,
                    '!' => TokenKind::Bang,
                    '@' => TokenKind::At,
                    _ => TokenKind::Char,
                };
                tokens.push(Token::new(kind, i, c.to_string()));
                i += 1;
            }
        }
    }

    tokens.push(Token::new(TokenKind::End, chars.len(), ""));
    Ok(tokens)
}
