//! chat-relay - Streaming relay for LLM chat completions
//!
//! Serves `POST /api/chat` and `GET /api/health`, forwarding each chat to the
//! configured completion provider and streaming the text back.

use chat_relay::config::Config;
use chat_relay::credentials::EnvCredentials;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chat-relay")]
#[command(about = "Streaming relay for LLM chat completions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Override listen address
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Validate configuration and report whether the API key is available
    Check {
        /// Path to configuration file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    })
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("chat_relay={},tower_http=info", level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, listen } => {
            let mut config = load_config(config.as_deref())?;
            init_tracing(&config.logging.level);

            if let Some(addr) = listen {
                tracing::info!(listen = %addr, "Override listen address");
                config.server.listen = addr;
            }

            let credentials = EnvCredentials::new(config.upstream.api_key_env.clone());
            if !credentials.is_set() {
                tracing::warn!(
                    var = %credentials.var(),
                    "API key variable is not set; chat requests will fail until it is"
                );
            }

            chat_relay::proxy::run_server(config).await
        }

        Commands::Check { config } => {
            let config = load_config(config.as_deref())?;
            init_tracing(&config.logging.level);

            let credentials = EnvCredentials::new(config.upstream.api_key_env.clone());
            println!("Configuration OK");
            println!("  listen:        {}", config.server.listen);
            println!("  upstream:      {}", config.upstream.base_url);
            println!("  default model: {}", config.upstream.default_model);
            println!(
                "  api key:       {} ({})",
                credentials.var(),
                if credentials.is_set() { "set" } else { "NOT SET" }
            );
            Ok(())
        }
    }
}
