//! Solace application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialize logging
//! 3. Build the chatbot engine (scored + general backends, embeddings, sentiment)
//! 4. Serve the REST API, or run the interactive console

mod cli;
mod console;
mod wiring;

use std::sync::Arc;

use clap::Parser;

use solace_api::routes::start_server;
use solace_api::state::AppState;
use solace_core::config::SolaceConfig;

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = SolaceConfig::load_or_default(&config_file);
    config.server.port = args.resolve_port(config.server.port);

    // Tracing. The console keeps its terminal quiet unless asked otherwise.
    let fallback_level = match (args.command(), &args.log_level) {
        (Command::Console, None) => "warn".to_string(),
        _ => args.resolve_log_level(&config.general.log_level),
    };
    solace_core::logging::init(&fallback_level);

    tracing::info!("Starting Solace v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Engine.
    let engine = match wiring::build_engine(&config) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize chatbot engine");
            return Err(e.into());
        }
    };

    match args.command() {
        Command::Serve => {
            let state = AppState::new(engine, config);
            start_server(state).await?;
        }
        Command::Console => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            console::run_console(&engine, stdin, &mut stdout).await?;
        }
    }

    Ok(())
}
