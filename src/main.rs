use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contact_assist::client::ApiClient;
use contact_assist::config::Config;
use contact_assist::dispatch::{CommandDispatcher, EchoDispatcher};
use contact_assist::search::{EntitySearchProvider, InMemoryDirectory};
use contact_assist::tui::TuiRunner;

#[derive(Parser)]
#[command(name = "contact-assist")]
#[command(about = "Natural-language assistant for your contacts, with @-mentions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive assistant
    Chat {
        /// Run against built-in sample contacts and an echoing backend
        #[arg(long, default_value = "false")]
        demo: bool,
    },
    /// Search contacts the way the mention picker does
    Search {
        /// Partial name or e-mail; empty lists recent contacts
        #[arg(default_value = "")]
        query: String,
        /// Maximum results (default: mentions.search_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Configure contact-assist
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
        /// Set the backend base URL
        #[arg(long)]
        api_url: Option<String>,
        /// Set the API bearer token
        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so its logs go to a file
    let log_to_file = matches!(cli.command, Commands::Chat { .. });
    init_tracing(log_to_file)?;

    match cli.command {
        Commands::Chat { demo } => {
            run_chat(demo).await?;
        }
        Commands::Search { query, limit } => {
            run_search(&query, limit).await?;
        }
        Commands::Config {
            show,
            api_url,
            token,
        } => {
            handle_config(show, api_url, token)?;
        }
    }

    Ok(())
}

fn init_tracing(log_to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "contact_assist=info".into());

    if log_to_file {
        let path = Config::log_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

async fn run_chat(demo: bool) -> Result<()> {
    let config = Config::load()?;

    let provider: Arc<dyn EntitySearchProvider>;
    let dispatcher: Arc<dyn CommandDispatcher>;
    if demo {
        tracing::info!("Starting in demo mode");
        provider = Arc::new(InMemoryDirectory::sample());
        dispatcher = Arc::new(EchoDispatcher);
    } else {
        let client = Arc::new(ApiClient::new(&config.api)?);
        tracing::info!("Starting against {}", client.base_url());
        provider = client.clone();
        dispatcher = client;
    }

    let mut tui_runner = TuiRunner::new(&config, provider, dispatcher, demo);
    tui_runner.run().await
}

async fn run_search(query: &str, limit: Option<usize>) -> Result<()> {
    let config = Config::load()?;
    let client = ApiClient::new(&config.api)?;
    let limit = limit.unwrap_or(config.mentions.search_limit).max(1);

    let candidates = client.search(query, limit).await?;
    if candidates.is_empty() {
        println!("No contacts found");
        return Ok(());
    }

    for candidate in candidates {
        match &candidate.secondary_label {
            Some(secondary) => println!("{}\t{}\t{}", candidate.id, candidate.label, secondary),
            None => println!("{}\t{}", candidate.id, candidate.label),
        }
    }

    Ok(())
}

fn handle_config(show: bool, api_url: Option<String>, token: Option<String>) -> Result<()> {
    let mut config = Config::load_file()?;

    if show {
        let mut shown = config.clone();
        if let Some(token) = shown.api.token.as_mut() {
            *token = mask(token);
        }
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&shown)?);
        return Ok(());
    }

    let mut changed = false;

    if let Some(url) = api_url {
        config.api.base_url = url;
        changed = true;
        println!("API URL updated");
    }

    if let Some(token) = token {
        config.api.token = Some(token).filter(|t| !t.is_empty());
        changed = true;
        println!("Token updated");
    }

    if changed {
        // Round-trip through the loader so the saved file is normalized
        let config = Config::from_toml(&toml::to_string(&config)?)?;
        config.save()?;
        println!("Configuration saved to: {:?}", Config::config_path()?);
    } else {
        println!("No changes made. Use --show to view current configuration.");
    }

    Ok(())
}

fn mask(secret: &str) -> String {
    let skip = secret.chars().count().saturating_sub(4);
    format!("****{}", secret.chars().skip(skip).collect::<String>())
}
