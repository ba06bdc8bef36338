//! drainwatch HTTP server
//!
//! Accepts Heroku log-drain batches and serves the resulting metrics.

use clap::Parser;
use drainwatch::cli::{Cli, Command, generate_config_template};
use drainwatch::config::Config;
use drainwatch::error::AppError;
use drainwatch::{handlers, telemetry};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = &cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(path, template)?;
                println!("Configuration template written to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::read_file(path)?,
        None => Config::default(),
    };
    cli.overrides.apply(&mut config);
    config
        .validate()
        .map_err(|e| AppError::ConfigValidationFailed {
            path: cli.config.clone().unwrap_or_else(|| "<defaults>".to_string()),
            reason: e.to_string(),
        })?;

    telemetry::init(&config.observability.log_level);

    let addr = config.socket_addr()?;
    let config = Arc::new(config);
    let state = handlers::AppState::new(config.clone())?;
    let app = handlers::router(state);

    tracing::info!(
        address = %addr,
        logs_path = %config.server.logs_path,
        metrics_path = %config.server.metrics_path,
        token_check = config.token_check().is_some(),
        "Starting drainwatch"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
