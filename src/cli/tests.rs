//! Unit tests for CLI commands

use crate::cli::{demo_app, execute, Cli, Commands};
use crate::dispatcher::HandlerRequest;
use crate::runtime_config::RuntimeConfig;
use clap::Parser;
use http::Method;

fn run(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(args)?;
    let mut out = Vec::new();
    execute(&cli, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn test_match_command_parses() {
    let cli = Cli::try_parse_from(["trellis", "match", "/users/:id", "/users/1"]).unwrap();
    match cli.command {
        Commands::Match { template, path } => {
            assert_eq!(template, "/users/:id");
            assert_eq!(path, "/users/1");
        }
        _ => panic!("Expected Match command"),
    }
}

#[test]
fn test_generate_rejects_malformed_param() {
    let result = Cli::try_parse_from(["trellis", "generate", "/users/:id", "-p", "id"]);
    assert!(result.is_err());
}

#[test]
fn test_serve_addr_is_optional() {
    let cli = Cli::try_parse_from(["trellis", "serve"]).unwrap();
    assert!(matches!(cli.command, Commands::Serve { addr: None }));
    let cli = Cli::try_parse_from(["trellis", "serve", "--addr", "127.0.0.1:9000"]).unwrap();
    match cli.command {
        Commands::Serve { addr } => assert_eq!(addr.as_deref(), Some("127.0.0.1:9000")),
        _ => panic!("Expected Serve command"),
    }
}

#[test]
fn test_match_prints_params() {
    let out = run(&["trellis", "match", "/users/:id", "/users/42"]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["path"], "/users/42");
    assert_eq!(json["params"]["id"], "42");
}

#[test]
fn test_match_miss_is_error() {
    let err = run(&["trellis", "match", "/users/:id", "/posts/42"]).unwrap_err();
    assert!(err.to_string().contains("does not match"));
}

#[test]
fn test_generate_encodes_by_default() {
    let out = run(&["trellis", "generate", "/users/:id", "-p", "id=a b"]).unwrap();
    assert_eq!(out, "/users/a%20b\n");
}

#[test]
fn test_generate_repeated_values() {
    let out = run(&[
        "trellis", "generate", "/files/:path+", "-p", "path=a", "--param", "path=b",
    ])
    .unwrap();
    assert_eq!(out, "/files/a/b\n");
}

#[test]
fn test_generate_missing_param_is_error() {
    let err = run(&["trellis", "generate", "/users/:id"]).unwrap_err();
    assert!(err.to_string().contains("to be a string"));
}

#[test]
fn test_inspect_lists_tokens_and_regex() {
    let out = run(&["trellis", "inspect", "/users/:id"]).unwrap();
    assert!(out.starts_with("tokens:\n"));
    assert!(out.contains("NAME"));
    assert!(out.contains("segments:"));
    assert!(out.contains("regex: "));
}

#[test]
fn test_inspect_reports_parse_error() {
    assert!(run(&["trellis", "inspect", "/users/:"]).is_err());
}

#[test]
fn test_demo_app_routes() {
    let app = demo_app(&RuntimeConfig::default()).unwrap();
    let lines = app.route_lines();
    assert!(lines.contains(&"GET /health".to_string()));
    assert!(lines.contains(&"GET /users/:id".to_string()));
    assert!(lines.contains(&"POST /users".to_string()));

    let resp = app.handle(&HandlerRequest::new(Method::GET, "/users/7"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["id"], "7");

    let resp = app.handle(&HandlerRequest::new(Method::GET, "/files/a/b/c.txt"));
    assert_eq!(resp.body["path"], serde_json::json!(["a", "b", "c.txt"]));

    let resp = app.handle(&HandlerRequest::new(Method::GET, "/fail"));
    assert_eq!(resp.status, 500);

    let resp = app.handle(&HandlerRequest::new(Method::GET, "/metrics"));
    assert_eq!(resp.status, 200);
    let body = resp.body.as_str().unwrap();
    assert!(body.contains("trellis_requests_total"));
}
