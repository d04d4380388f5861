//! Achaar application binary - composition root.
//!
//! `achaar serve` runs the chat and upload proxy; `achaar chat` runs the
//! terminal front-end against a running server.

mod cli;
mod terminal;

use std::sync::Arc;

use clap::Parser;

use achaar_api::routes;
use achaar_api::state::AppState;
use achaar_client::{ChatStore, HttpTransport, RetryPolicy};
use achaar_core::config::AchaarConfig;
use achaar_extract::PdfExtractor;
use achaar_provider::{ChatModel, GeminiModel};

use cli::{CliArgs, Command};
use terminal::Terminal;

async fn serve(
    mut config: AchaarConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = host {
        config.server.host = host;
    }
    config.server.port = cli::resolve_port(port, config.server.port);

    let model: Option<Arc<dyn ChatModel>> = match config.provider.api_key_from_env() {
        Some(key) => {
            tracing::info!(model = %config.provider.model, "Model provider configured");
            Some(Arc::new(GeminiModel::new(&config.provider.base_url, key)))
        }
        None => {
            tracing::warn!(
                env = %config.provider.api_key_env,
                "No API key found; chat requests will be rejected"
            );
            None
        }
    };

    let state = AppState::new(config.clone(), model, Arc::new(PdfExtractor::new()));
    routes::start_server(&config, state).await?;
    Ok(())
}

async fn chat(config: AchaarConfig, endpoint: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = cli::resolve_endpoint(endpoint, &config.client.endpoint);
    tracing::info!(endpoint = %endpoint, "Starting terminal chat");

    let store = Arc::new(ChatStore::new(
        Arc::new(HttpTransport::new(endpoint)),
        RetryPolicy::from(&config.client),
    ));
    Terminal::new(store).run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config = AchaarConfig::load_or_default(&config_file);
    let log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        path = %config_file.display(),
        "Starting Achaar v{}",
        env!("CARGO_PKG_VERSION")
    );

    match args.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Chat { endpoint } => chat(config, endpoint).await,
    }
}
