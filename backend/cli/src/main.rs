mod api;
mod check_config_cmd;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use tunebot_channels::{ChannelAdapter, LineAdapter, LineConfig};
use tunebot_config::TunebotConfig;
use tunebot_conversation::{GeneratorSettings, HistoryLimit, ResponseGenerator};
use tunebot_core::{LlmProvider, TuneError};
use tunebot_logging::{init_logger, LogOptions};
use tunebot_providers::{AzureOpenAiConfig, AzureOpenAiProvider};

#[derive(Parser)]
#[command(name = "tunebot")]
#[command(about = "tunebot: LINE bot that recommends playlists for your mood")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Load and validate configuration, then print it with secrets masked
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let mut config =
                tunebot_config::load().map_err(|e| TuneError::Config(format!("{e:#}")))?;
            if let Some(port) = port {
                config.server.port = port;
            }

            init_logger(&LogOptions {
                level: config.logging.level.clone(),
                log_dir: config.logging.dir.as_ref().map(PathBuf::from),
                json: config.logging.json,
            });
            tunebot_config::ensure_valid(&config)?;

            run_server(config).await?;
        }
        Commands::CheckConfig => check_config_cmd::run()?,
    }

    Ok(())
}

async fn run_server(config: TunebotConfig) -> Result<()> {
    let addr = config.server.addr();
    info!(
        addr = %addr,
        webhook = %config.server.webhook_path,
        model = %config.azure.model,
        "Starting tunebot"
    );
    debug!(config = %config.redacted_summary(), "Effective configuration");

    let provider: Arc<dyn LlmProvider> = Arc::new(AzureOpenAiProvider::new(AzureOpenAiConfig {
        endpoint: config.azure.endpoint.clone(),
        api_key: config.azure.api_key.clone(),
        api_version: config.azure.api_version.clone(),
        timeout: config.azure.timeout(),
    })?);
    info!(provider = provider.name(), "Registered completion provider");

    let mut settings = GeneratorSettings::new(&config.azure.model);
    settings.history_limit = HistoryLimit::from(config.conversation.history_max_turns);
    settings.reset_commands_enabled = config.conversation.reset_commands_enabled;
    let generator = Arc::new(ResponseGenerator::new(provider, settings));

    let line = LineAdapter::new(
        LineConfig {
            channel_secret: config.line.channel_secret.clone(),
            channel_access_token: config.line.channel_access_token.clone(),
            webhook_path: config.server.webhook_path.clone(),
            api_base_url: config.line.api_base_url.clone(),
        },
        generator,
    )?;
    info!(adapter = line.name(), "Registered channel adapter");

    let app = api::build_router(line.build_router()).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
