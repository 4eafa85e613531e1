mod clipboard;
mod component;
mod config;
mod debounce;
mod editor;
mod export;
mod extract;
mod gateway;
mod preview;
mod prompts;
mod shell;
mod store;
mod workspace;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::clipboard::SystemClipboard;
use crate::component::Framework;
use crate::config::Config;
use crate::gateway::{AiGateway, GeminiGateway, UnconfiguredGateway};
use crate::preview::DEFAULT_PREVIEW_PORT;
use crate::store::file_repository::FileComponentRepository;
use crate::workspace::Workspace;

#[derive(Parser)]
#[command(name = "ideafy", version, about = "Generate UI components from a description")]
enum Cli {
    /// Interactive session (default when no subcommand is given)
    Shell,
    /// Generate a component and print its code
    #[command(alias = "gen")]
    Generate {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
        #[arg(long, short, default_value_t = Framework::default())]
        framework: Framework,
        /// Save the result to the workspace
        #[arg(long)]
        save: bool,
        /// Also write Ideafy-Component.html into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Ask for an enhanced version of a description
    Suggest {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },
    /// List saved components, newest first
    #[command(alias = "ls")]
    List,
    /// Print the code of a saved component
    Show { id: i64 },
    /// Delete a saved component
    #[command(alias = "rm")]
    Delete { id: i64 },
    /// Write a saved component to Ideafy-Component.html
    Export {
        id: i64,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Copy a saved component's code to the clipboard
    Copy { id: i64 },
    /// Serve a saved component on localhost
    Preview {
        id: i64,
        #[arg(long, default_value_t = DEFAULT_PREVIEW_PORT)]
        port: u16,
    },
    /// List the supported frameworks
    Frameworks,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Default to the interactive shell when no subcommand is given,
    // but still allow --help and --version to work.
    let cli = if std::env::args().len() <= 1 {
        Cli::Shell
    } else {
        Cli::parse()
    };

    let config = Config::from_env();
    init_tracing();
    let _guard = sentry::init((
        config.sentry_dsn.clone().unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.environment.clone().into()),
            enable_logs: true,
            ..Default::default()
        },
    ));

    run(cli, config).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ideafy=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true).with_bracketed_fields(false))
        .with(sentry::integrations::tracing::layer().event_filter(
            |metadata| match *metadata.level() {
                tracing::Level::ERROR => sentry::integrations::tracing::EventFilter::Event,
                tracing::Level::WARN | tracing::Level::INFO => {
                    sentry::integrations::tracing::EventFilter::Breadcrumb
                }
                _ => sentry::integrations::tracing::EventFilter::Ignore,
            },
        ))
        .init();
}

fn build_gateway(config: &Config) -> Result<Arc<dyn AiGateway>> {
    let Some(api_key) = config.api_key.clone() else {
        tracing::warn!("GEMINI_API_KEY is not set; generation is unavailable");
        return Ok(Arc::new(UnconfiguredGateway));
    };

    let http_client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(config.request_timeout)
        .build()
        .context("failed to build HTTP client")?;

    let gateway = GeminiGateway::new(http_client, &config.api_base, &config.model, api_key);
    tracing::debug!(model = gateway.model(), "Gemini gateway ready");
    Ok(Arc::new(gateway))
}

async fn open_workspace(config: &Config) -> Result<Workspace> {
    let repository = Arc::new(FileComponentRepository::new(&config.data_dir));
    let gateway = build_gateway(config)?;
    Ok(Workspace::open(repository, gateway).await)
}

/// Open the workspace with the saved component `id` loaded.
async fn open_component(config: &Config, id: i64) -> Result<Workspace> {
    let mut ws = open_workspace(config).await?;
    ws.load(id)?;
    Ok(ws)
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli {
        Cli::Shell => {
            let ws = open_workspace(&config).await?;
            let export_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            shell::Session::run(ws, Arc::new(SystemClipboard::new()), export_dir).await?;
        }
        Cli::Generate {
            description,
            framework,
            save,
            out,
        } => {
            let mut ws = open_workspace(&config).await?;
            let code = ws.generate(&description.join(" "), framework).await?;
            println!("{code}");
            if save {
                let saved = ws.save().await?;
                eprintln!("Component saved! (id {})", saved.id);
            }
            if let Some(dir) = out {
                let path = ws.export(&dir).await?;
                eprintln!("File downloaded: {}", path.display());
            }
        }
        Cli::Suggest { description } => {
            let mut ws = open_workspace(&config).await?;
            ws.set_prompt(description.join(" "));
            println!("{}", ws.suggest().await?);
        }
        Cli::List => {
            let ws = open_workspace(&config).await?;
            if ws.saved().is_empty() {
                println!("No components yet. Generate and save components to see them here.");
            }
            for component in ws.saved() {
                println!("{}", shell::summary_line(component));
            }
        }
        Cli::Show { id } => {
            let ws = open_component(&config, id).await?;
            println!("{}", ws.state().code);
        }
        Cli::Delete { id } => {
            let mut ws = open_workspace(&config).await?;
            ws.delete(id).await?;
            println!("Component deleted");
        }
        Cli::Export { id, out } => {
            let ws = open_component(&config, id).await?;
            let path = ws.export(&out).await?;
            println!("File downloaded: {}", path.display());
        }
        Cli::Copy { id } => {
            let ws = open_component(&config, id).await?;
            ws.copy(&SystemClipboard::new()).await?;
            println!("Code copied to clipboard");
        }
        Cli::Preview { id, port } => {
            let ws = open_component(&config, id).await?;
            preview::serve(&ws.state().code, port).await?;
        }
        Cli::Frameworks => {
            for fw in Framework::ALL {
                println!("{:<24} {}", fw.id(), fw.label());
            }
        }
    }
    Ok(())
}
