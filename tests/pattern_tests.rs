//! Public-API tests for the route pattern engine: lexing, parsing, matching,
//! generation, and the match/generate round trip.

use trellis::pattern::{
    lex, GenerateOptions, MatchOptions, Matcher, ParamValue, ParseOptions, PathGenerator,
    PathParams, PatternError, PatternSequence, TokenKind,
};

fn params(pairs: &[(&str, ParamValue)]) -> PathParams {
    pairs.iter().cloned().collect()
}

fn round_trip(template: &str, values: PathParams) {
    let generator = PathGenerator::compile(template).unwrap();
    let matcher = Matcher::compile(template).unwrap();
    let path = generator.generate(&values).unwrap();
    let found = matcher
        .matches(&path)
        .unwrap_or_else(|| panic!("{template}: generated {path} does not match"));
    assert_eq!(found.params, values, "{template} via {path}");
}

#[test]
fn test_round_trip() {
    round_trip("/users/:id", params(&[("id", "42".into())]));
    round_trip("/users/:id", params(&[("id", "a b/c?".into())]));
    round_trip("/users/:id/posts/:post_id", params(&[("id", "1".into()), ("post_id", "x".into())]));
    round_trip("/files/{*path}", params(&[("path", vec!["a", "b c", "d.txt"].into())]));
    round_trip("/files/{*path}", PathParams::new());
    round_trip("/tags{/:tag}+", params(&[("tag", vec!["rust", "may"].into())]));
    round_trip(r"/v:major(\d+){.:minor(\d+)}?", params(&[("major", "2".into()), ("minor", "1".into())]));
    round_trip(r"/v:major(\d+){.:minor(\d+)}?", params(&[("major", "3".into())]));
    round_trip("/search/:q?", PathParams::new());
    round_trip("/café/:name", params(&[("name", "crème".into())]));
}

#[test]
fn test_users_id() {
    let m = Matcher::compile("/users/:id").unwrap();
    let found = m.matches("/users/42").unwrap();
    assert_eq!(found.params.get_str("id"), Some("42"));
    assert_eq!(found.params.len(), 1);
    assert!(m.matches("/users/").is_none());
    assert!(m.matches("/users").is_none());
}

#[test]
fn test_files_wildcard() {
    let m = Matcher::compile("/files/{*path}").unwrap();
    let found = m.matches("/files/a/b/c").unwrap();
    assert_eq!(
        found.params.get("path"),
        Some(&ParamValue::Repeated(vec!["a".into(), "b".into(), "c".into()]))
    );

    let bare = m.matches("/files").unwrap();
    assert!(bare.params.get("path").is_none());
    assert!(bare.params.is_empty());
}

#[test]
fn test_version_prefix_pattern() {
    let m = Matcher::compile(r"/v:version(\d+)/ping").unwrap();
    assert_eq!(m.matches("/v12/ping").unwrap().params.get_str("version"), Some("12"));
    assert!(m.matches("/vx/ping").is_none());
}

#[test]
fn test_unmatched_optional_is_absent() {
    let m = Matcher::compile("/posts/:id/:slug?").unwrap();
    let found = m.matches("/posts/7").unwrap();
    assert_eq!(found.params.get_str("id"), Some("7"));
    assert!(!found.params.contains("slug"));
}

#[test]
fn test_duplicate_names_last_capture_wins() {
    let m = Matcher::compile("/:x/:x").unwrap();
    let found = m.matches("/a/b").unwrap();
    assert_eq!(found.params.len(), 1);
    assert_eq!(found.params.get_str("x"), Some("b"));
}

#[test]
fn test_keys_in_capture_order() {
    let m = Matcher::compile("/:a/{*rest}").unwrap();
    let names: Vec<&str> = m.keys().iter().map(|k| &*k.name).collect();
    assert_eq!(names, vec!["a", "rest"]);
}

#[test]
fn test_prefix_matching_without_end_anchor() {
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
    assert!(m.matches("/apiary").is_none());
}

#[test]
fn test_raw_values_without_decode() {
    let m = Matcher::with_options(
        "/users/:name",
        &ParseOptions::default(),
        MatchOptions {
            decode: false,
            ..MatchOptions::default()
        },
    )
    .unwrap();
    let found = m.matches("/users/a%20b").unwrap();
    assert_eq!(found.params.get_str("name"), Some("a%20b"));
}

#[test]
fn test_lexer_tokens() {
    let tokens = lex(r"/:id(\d+){\;x}?").unwrap();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Char,
            TokenKind::Name,
            TokenKind::Pattern,
            TokenKind::Open,
            TokenKind::Escaped,
            TokenKind::Char,
            TokenKind::Close,
            TokenKind::Question,
            TokenKind::End,
        ]
    );
    assert_eq!(tokens[1].index, 1);
    assert_eq!(tokens[2].value, r"\d+");
}

#[test]
fn test_lexer_errors_carry_index() {
    let err = lex("/users/:").unwrap_err();
    assert!(err.is_parse_error());
    assert_eq!(err.index(), Some(7));

    for bad in ["/(abc", "/()", "/(?:a)", "/((a))", "/:id*", "/a\\"] {
        let err = lex(bad).unwrap_err();
        assert!(matches!(err, PatternError::Parse { .. }), "{bad}");
    }
}

#[test]
fn test_named_group_in_custom_pattern_rejected() {
    let err = Matcher::compile(r"/:a((?P<x>\d+))/:b").unwrap_err();
    assert!(matches!(err, PatternError::Parse { .. }));
    assert!(err.to_string().contains("Capturing groups are not allowed"));

    // the non-capturing spelling keeps later captures aligned
    let m = Matcher::compile(r"/:a((?:\d+))/:b").unwrap();
    let found = m.matches("/12/hello").unwrap();
    assert_eq!(found.params.get_str("a"), Some("12"));
    assert_eq!(found.params.get_str("b"), Some("hello"));
}

#[test]
fn test_zero_or_more_without_pieces_is_absent() {
    let m = Matcher::compile(r"/x{/:p(a*)}*").unwrap();
    assert!(!m.matches("/x/").unwrap().params.contains("p"));
    assert!(!m.matches("/x").unwrap().params.contains("p"));
}

#[test]
fn test_parse_errors_surface_from_matcher() {
    let err = Matcher::compile("/a}").unwrap_err();
    assert_eq!(err.index(), Some(2));
    assert!(PathGenerator::compile("/{a").is_err());
}

#[test]
fn test_sequence_is_reusable() {
    let seq = PatternSequence::parse("/users/:id").unwrap();
    let matcher = Matcher::new(&seq, MatchOptions::default()).unwrap();
    let generator = PathGenerator::new(&seq, GenerateOptions::default()).unwrap();
    assert_eq!(matcher.template(), generator.template());
    assert_eq!(seq.params().count(), 1);
}
