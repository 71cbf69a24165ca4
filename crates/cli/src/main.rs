//! OpenSource Copilot CLI: the main entry point.
//!
//! Commands:
//! - `serve`   Start the HTTP gateway
//! - `chat`    One-shot or interactive chat in the terminal
//! - `tools`   List the registered tools
//! - `doctor`  Check configuration and provider reachability

use anyhow::Context;
use clap::{Parser, Subcommand};
use oscopilot_config::AppConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "oscopilot",
    about = "OpenSource Copilot: ask about the health of open-source projects",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.oscopilot/config.toml)
    #[arg(short, long, global = true, env = "OSCOPILOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the bind address
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Repository under discussion, as owner/name
        #[arg(short, long)]
        repo: Option<String>,
    },

    /// List available tools
    Tools,

    /// Diagnose configuration and provider health
    Doctor,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let json = std::env::var("OSCOPILOT_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_with_env(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => AppConfig::load().context("failed to load config"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve { host, port } => {
            let config = load_config(cli.config.as_ref())?;
            commands::serve::run(config, host, port).await
        }
        Commands::Chat { message, repo } => {
            let config = load_config(cli.config.as_ref())?;
            commands::chat::run(config, message, repo).await
        }
        Commands::Tools => {
            let config = load_config(cli.config.as_ref())?;
            commands::tools::run(&config);
            Ok(())
        }
        Commands::Doctor => commands::doctor::run(cli.config.as_ref()).await,
    }
}
