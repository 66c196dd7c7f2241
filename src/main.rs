//! Bootstraps one SDK instance from a config file and logs the requested keys.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tolgee_sync::Sdk;
use tolgee_sync::codec::strip_markers;
use tolgee_sync::config::load_from_file;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tolgee-sync", version, about = "Fetch and print translations from a Tolgee project")]
struct Cli {
    /// JSON config file (baseUrl, apiKey, mode, ...)
    config: PathBuf,

    /// Key names to translate after the bootstrap
    keys: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match load_from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = ?cli.config, error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    let sdk = match Sdk::builder(config).build() {
        Ok(sdk) => sdk,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create SDK");
            return ExitCode::FAILURE;
        }
    };

    match sdk.bootstrap().await {
        Ok(outcome) => {
            tracing::info!(?outcome, language = %sdk.current_language(), "Bootstrap finished");
        }
        Err(e) => {
            tracing::error!(error = %e, "Bootstrap failed");
            return ExitCode::FAILURE;
        }
    }

    for key in &cli.keys {
        match sdk.translate(key).await {
            Ok(text) => {
                let text = strip_markers(&text);
                tracing::info!(key = %key, text = %text, "Translation");
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Translation unavailable"),
        }
    }

    sdk.release();
    ExitCode::SUCCESS
}
