use trellis::cli::run_cli;
use trellis::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let level = std::env::var("TRELLIS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    init_logging(&level)?;
    run_cli()
}
