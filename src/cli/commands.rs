use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::app::App;
use crate::dispatcher::{HandlerError, HandlerResponse, HandlerResult};
use crate::middleware::{MetricsMiddleware, Middleware, TracingMiddleware};
use crate::pattern::{
    lex, GenerateOptions, Matcher, ParamValue, PathGenerator, PathParams, PatternSequence,
};
use crate::runtime_config::RuntimeConfig;

/// Command-line interface for trellis
///
/// Inspect route templates, try them against paths, and run a demo server.
#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Route pattern toolkit and demo server", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match a path against a template and print the captured parameters as JSON
    Match {
        /// Route template, e.g. `/users/:id`
        template: String,
        /// Concrete path, e.g. `/users/42`
        path: String,
    },
    /// Build a path from a template and parameter values
    Generate {
        /// Route template, e.g. `/users/:id`
        template: String,

        /// `name=value`; repeat the flag to give a repeated parameter several values
        #[arg(short, long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// Skip percent-encoding of values
        #[arg(long, default_value_t = false)]
        no_encode: bool,
    },
    /// Print the tokens, segments and compiled regex of a template
    Inspect {
        /// Route template
        template: String,
    },
    /// Run a demo server configured from PORT / HOSTNAME / TRELLIS_* variables
    Serve {
        /// Override the bind address (host:port)
        #[arg(long)]
        addr: Option<String>,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

/// Parse arguments from the process and execute
///
/// # Errors
///
/// Returns an error if the template does not parse, the path does not match,
/// the parameters do not fit the template, or the server fails to start.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    execute(&cli, &mut stdout.lock())
}

/// Execute a parsed command, writing its output to `out`
///
/// # Errors
///
/// See [`run_cli`].
pub fn execute(cli: &Cli, out: &mut impl Write) -> Result<()> {
    match &cli.command {
        Commands::Match { template, path } => {
            let matcher = Matcher::compile(template)?;
            let found = matcher
                .matches(path)
                .ok_or_else(|| anyhow!("`{path}` does not match `{template}`"))?;
            let json = serde_json::json!({
                "path": found.path,
                "params": found.params,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
            Ok(())
        }
        Commands::Generate {
            template,
            params,
            no_encode,
        } => {
            let sequence = PatternSequence::parse(template)?;
            let params = collect_params(&sequence, params);
            let options = GenerateOptions {
                encode: !*no_encode,
                ..GenerateOptions::default()
            };
            let generator = PathGenerator::new(&sequence, options)?;
            writeln!(out, "{}", generator.generate(&params)?)?;
            Ok(())
        }
        Commands::Inspect { template } => {
            writeln!(out, "tokens:")?;
            for token in lex(template)? {
                writeln!(out, "  {:<14} {:>3}  {}", token.kind.as_str(), token.index, token.value)?;
            }
            let sequence = PatternSequence::parse(template)?;
            writeln!(out, "segments:")?;
            for segment in sequence.segments() {
                writeln!(out, "  {segment:?}")?;
            }
            let matcher = Matcher::compile(template)?;
            writeln!(out, "regex: {}", matcher.source())?;
            Ok(())
        }
        Commands::Serve { addr } => serve(addr.as_deref()),
    }
}

/// Group `name=value` pairs by name.
///
/// Repeated parameters (`+` / `*`) collect every value given for them; any
/// other parameter keeps the last one.
fn collect_params(sequence: &PatternSequence, pairs: &[(String, String)]) -> PathParams {
    let mut params = PathParams::new();
    for descriptor in sequence.params() {
        let values: Vec<&String> = pairs
            .iter()
            .filter(|(k, _)| **k == *descriptor.name)
            .map(|(_, v)| v)
            .collect();
        let Some(last) = values.last() else {
            continue;
        };
        let value = if descriptor.modifier.is_repeated() {
            ParamValue::Repeated(values.iter().map(|v| (*v).clone()).collect())
        } else {
            ParamValue::Single((*last).clone())
        };
        params.insert(Arc::clone(&descriptor.name), value);
    }
    params
}

/// App served by `trellis serve`
///
/// # Errors
///
/// Only fails on registration errors, which the fixed routes never hit.
pub fn demo_app(config: &RuntimeConfig) -> Result<App> {
    let mut app = App::from_config(config);
    let metrics = Arc::new(MetricsMiddleware::new());
    app.set_middleware([
        Arc::new(TracingMiddleware) as Arc<dyn Middleware>,
        Arc::clone(&metrics) as Arc<dyn Middleware>,
    ])?;

    app.get("/health", |_req, _params| {
        Ok(HandlerResponse::json(200, serde_json::json!({ "status": "ok" })))
    })?;
    app.get("/metrics", move |_req, _params| {
        Ok(HandlerResponse::text(200, metrics.render()))
    })?;
    app.get("/users/:id", |req, params| {
        Ok(HandlerResponse::json(
            200,
            serde_json::json!({
                "id": params.get_str("id"),
                "requestId": req.request_id.to_string(),
            }),
        ))
    })?;
    app.post("/users", |req, _params| {
        let user: serde_json::Value = req.json()?;
        Ok(HandlerResponse::json(201, user))
    })?;
    app.get("/files/{*path}", |_req, params| {
        Ok(HandlerResponse::json(
            200,
            serde_json::json!({ "path": params.get_all("path") }),
        ))
    })?;
    app.get("/fail", |_req, _params| -> HandlerResult {
        Err(HandlerError::fault("demo failure"))
    })?;
    Ok(app)
}

fn serve(addr: Option<&str>) -> Result<()> {
    let config = RuntimeConfig::from_env();
    let bind = addr.map_or_else(|| config.bind_addr(), str::to_string);
    let mut app = demo_app(&config)?;
    app.print_routes();
    let bound = app
        .serve(bind.as_str())
        .with_context(|| format!("failed to serve on {bind}"))?;
    info!(addr = %bound, "trellis demo server started");
    wait_for_shutdown()?;
    app.close();
    Ok(())
}

#[cfg(unix)]
fn wait_for_shutdown() -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown() -> Result<()> {
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(())
}
