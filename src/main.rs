// ABOUTME: Entry point for parley, a terminal client for the chat API.
// ABOUTME: Parses CLI args, initializes logging, loads config, and launches the app.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use parley::app::App;
use parley::cli::Args;
use parley::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env();
    args.apply(&mut config);

    App::new(config, args.fresh).run().await
}
